//! AI 요청 문장 생성과 응답 해석. 네트워크와 무관한 순수 함수만 둔다.

use crate::feasibility::{CalculationResults, ProjectInputs};
use crate::format::grouped;

/// 위치가 비었을 때 프롬프트에 쓰는 지역명
pub const FALLBACK_LOCATION: &str = "Greece (General)";
/// 분석 결과가 비었을 때의 문구
pub const EMPTY_ANALYSIS: &str = "No analysis generated.";
/// 시각화 지시문 기본값
pub const DEFAULT_DESIGN_PROMPT: &str = "Add a modern mediterranean villa with a pool and garden";

/// 그리스 시장 개발 컨설턴트 관점의 사업성 분석 요청문.
pub fn analysis_prompt(inputs: &ProjectInputs, results: &CalculationResults) -> String {
    let location = inputs.location.trim();
    let area = if location.is_empty() {
        FALLBACK_LOCATION
    } else {
        location
    };
    let market = if location.is_empty() {
        "the Greek market"
    } else {
        location
    };
    format!(
        "Act as a senior real estate development consultant specializing in the Greek market.
Analyze the following residential development scenario:

**Project Location:**
- Area/City: {area}

**Input Data:**
- Plot Size: {plot_size} m²
- Plot Price: €{plot_price}
- Building Coefficient (Σ.Δ.): {coef}
- Max Buildable Area (Calculated): {buildable} m²
- Construction Cost (excl. plot): €{cost_sqm}/m²
- Target Sale Price: €{sale_sqm}/m²
- Miscellaneous/Buffer Costs: {misc}%

**Calculated Results:**
- Total Investment: €{total}
- Effective Cost per m² (All-in): €{cost_all_in}
- Total Revenue: €{revenue}
- Net Profit: €{profit}
- Profit Margin (Net/Revenue): {margin:.2}%
- ROI (Net/Cost): {roi:.2}%

**Task:**
Provide a concise executive summary (max 200 words) in Markdown format.
1. **Location Context**: Briefly mention if the costs/prices seem realistic for {market}.
2. **Financial Viability**: Is the margin healthy? (Standard is 15-25%).
3. **Risk Analysis**: Highlight the biggest risk (e.g., land cost vs. buildable area).
4. **Recommendation**: Proceed, Negotiate, or Walk Away.
",
        plot_size = inputs.plot_size,
        plot_price = grouped(inputs.plot_price, 0),
        coef = inputs.building_coefficient,
        buildable = grouped(results.max_buildable_area, 2),
        cost_sqm = inputs.construction_cost_per_sqm,
        sale_sqm = inputs.sale_price_per_sqm,
        misc = inputs.misc_costs_percent,
        total = grouped(results.construction_cost_total_incl_plot, 0),
        cost_all_in = grouped(results.cost_per_sqm_incl_plot, 2),
        revenue = grouped(results.revenue_total, 0),
        profit = grouped(results.profit_total, 0),
        margin = results.profit_margin,
        roi = results.roi,
    )
}

/// 대지 총액 추정 요청문. 숫자만 돌려받도록 지시한다.
pub fn estimate_prompt(location: &str, plot_size: f64) -> String {
    format!(
        "You are a real estate valuation expert for the Greek market.

Task: Estimate the current market price (Total Price in Euros) for a residential plot.

Details:
- Location: \"{location}\"
- Plot Size: {plot_size} square meters

Instructions:
1. Analyze the location value per square meter in Greece.
2. Calculate the total plot price.
3. Return ONLY the integer number (e.g. 150000).
4. Do NOT output any text, explanation, or currency symbols.
",
        location = location.trim(),
    )
}

/// 사진 편집 지시문.
pub fn visualization_prompt(user_prompt: &str) -> String {
    format!(
        "Edit this image of a property/plot: {}. Keep it realistic.",
        user_prompt.trim()
    )
}

/// 가격 추정 응답에서 숫자만 남겨 정수로 읽는다. 숫자가 없으면 0.
pub fn parse_price_estimate(text: &str) -> f64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0.0;
    }
    digits.parse::<u64>().map(|v| v as f64).unwrap_or(0.0)
}

/// 분석 응답이 비었으면 기본 문구로 대체한다.
pub fn analysis_or_placeholder(text: Option<String>) -> String {
    match text {
        Some(t) if !t.trim().is_empty() => t,
        _ => EMPTY_ANALYSIS.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feasibility::calculate;

    #[test]
    fn analysis_prompt_embeds_results() {
        let inputs = ProjectInputs::default();
        let text = analysis_prompt(&inputs, &calculate(&inputs));
        assert!(text.contains("Area/City: Athens, Greece"));
        assert!(text.contains("Plot Price: €150,000"));
        assert!(text.contains("Total Investment: €913,500"));
        assert!(text.contains("Effective Cost per m² (All-in): €2,283.75"));
        assert!(text.contains("Profit Margin (Net/Revenue): 45.6"));
        assert!(text.contains("ROI (Net/Cost): 83.91%"));
    }

    #[test]
    fn analysis_prompt_falls_back_without_location() {
        let inputs = ProjectInputs::empty();
        let text = analysis_prompt(&inputs, &calculate(&inputs));
        assert!(text.contains("Area/City: Greece (General)"));
        assert!(text.contains("realistic for the Greek market."));
    }

    #[test]
    fn estimate_prompt_quotes_location() {
        let text = estimate_prompt(" Voula ", 350.0);
        assert!(text.contains("- Location: \"Voula\""));
        assert!(text.contains("- Plot Size: 350 square meters"));
    }

    #[test]
    fn price_parsing_keeps_digits_only() {
        assert_eq!(parse_price_estimate("150000"), 150_000.0);
        assert_eq!(parse_price_estimate("€ 185.000\n"), 185_000.0);
        assert_eq!(parse_price_estimate("I cannot tell"), 0.0);
        assert_eq!(parse_price_estimate(""), 0.0);
    }

    #[test]
    fn visualization_prompt_wraps_user_text() {
        assert_eq!(
            visualization_prompt("add a pool "),
            "Edit this image of a property/plot: add a pool. Keep it realistic."
        );
    }

    #[test]
    fn blank_analysis_gets_placeholder() {
        assert_eq!(analysis_or_placeholder(None), EMPTY_ANALYSIS);
        assert_eq!(analysis_or_placeholder(Some("  ".into())), EMPTY_ANALYSIS);
        assert_eq!(analysis_or_placeholder(Some("ok".into())), "ok");
    }
}
