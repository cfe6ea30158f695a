use serde::{Deserialize, Serialize};

/// 사업성 검토 입력값.
///
/// 숫자 필드는 모두 f64이며 음수도 그대로 받는다. 검증은 [`ProjectInputs::warnings`]가
/// 경고로만 알려주고 계산 자체는 막지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInputs {
    /// 대지 위치(표시 및 AI 프롬프트용, 계산에는 쓰지 않음)
    pub location: String,
    /// 소유주 연락처 등 메모
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_notes: Option<String>,
    /// 대지 면적 [m²]
    pub plot_size: f64,
    /// 대지 매입가 [EUR]
    pub plot_price: f64,
    /// 건축 계수(Σ.Δ.), 연면적/대지면적
    pub building_coefficient: f64,
    /// 공사비(대지 제외) [EUR/m²]
    pub construction_cost_per_sqm: f64,
    /// 목표 분양가 [EUR/m²]
    pub sale_price_per_sqm: f64,
    /// 세금/공증/인허가 예비비 [%]
    pub misc_costs_percent: f64,
}

impl Default for ProjectInputs {
    fn default() -> Self {
        Self {
            location: "Athens, Greece".to_string(),
            owner_notes: None,
            plot_size: 500.0,
            plot_price: 150_000.0,
            building_coefficient: 0.8,
            construction_cost_per_sqm: 1800.0,
            sale_price_per_sqm: 4200.0,
            misc_costs_percent: 5.0,
        }
    }
}

impl ProjectInputs {
    /// 모든 값이 0인 "지우기" 상태.
    pub fn empty() -> Self {
        Self {
            location: String::new(),
            owner_notes: None,
            plot_size: 0.0,
            plot_price: 0.0,
            building_coefficient: 0.0,
            construction_cost_per_sqm: 0.0,
            sale_price_per_sqm: 0.0,
            misc_costs_percent: 0.0,
        }
    }

    /// 입력값에 대한 계산 결과. [`calculate`]와 같다.
    pub fn results(&self) -> CalculationResults {
        calculate(self)
    }
}

/// 사업성 계산 결과. 저장하지 않고 항상 입력값에서 다시 계산한다.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CalculationResults {
    /// 최대 건축 가능 면적 [m²]
    pub max_buildable_area: f64,
    /// 공사비 합계(대지 제외) [EUR]
    pub construction_cost_total: f64,
    /// 예비비 [EUR]
    pub misc_costs_value: f64,
    /// 총 투자비(대지+공사+예비비) [EUR]
    pub construction_cost_total_incl_plot: f64,
    /// 총 분양 수입 [EUR]
    pub revenue_total: f64,
    /// 순이익 [EUR]
    pub profit_total: f64,
    /// 이익률(순이익/수입) [%]
    pub profit_margin: f64,
    /// ROI(순이익/투자비) [%]
    pub roi: f64,
    /// 대지 포함 m²당 원가 [EUR/m²]
    pub cost_per_sqm_incl_plot: f64,
}

/// 입력값으로 사업성 지표를 계산한다.
///
/// 전체 f64 범위에서 실패하지 않는다. 분모가 0 이하인 비율은 0으로 둔다.
/// 오버플로로 유한하지 않게 된 값도 0으로 둔다.
pub fn calculate(inputs: &ProjectInputs) -> CalculationResults {
    let max_buildable_area = finite_or_zero(inputs.plot_size * inputs.building_coefficient);
    let construction_cost_total =
        finite_or_zero(max_buildable_area * inputs.construction_cost_per_sqm);
    let misc_costs_value = finite_or_zero(
        (construction_cost_total + inputs.plot_price) * (inputs.misc_costs_percent / 100.0),
    );
    let construction_cost_total_incl_plot =
        finite_or_zero(inputs.plot_price + construction_cost_total + misc_costs_value);
    let revenue_total = finite_or_zero(max_buildable_area * inputs.sale_price_per_sqm);
    let profit_total = finite_or_zero(revenue_total - construction_cost_total_incl_plot);

    let profit_margin = ratio_percent(profit_total, revenue_total);
    let roi = ratio_percent(profit_total, construction_cost_total_incl_plot);
    let cost_per_sqm_incl_plot = if max_buildable_area > 0.0 {
        finite_or_zero(construction_cost_total_incl_plot / max_buildable_area)
    } else {
        0.0
    };

    CalculationResults {
        max_buildable_area,
        construction_cost_total,
        misc_costs_value,
        construction_cost_total_incl_plot,
        revenue_total,
        profit_total,
        profit_margin,
        roi,
        cost_per_sqm_incl_plot,
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

// 분모가 0 이하이면 0
fn ratio_percent(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        finite_or_zero(numerator / denominator * 100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflowing_inputs_yield_finite_results() {
        let huge = ProjectInputs {
            plot_size: 1e200,
            building_coefficient: 1e200,
            construction_cost_per_sqm: 0.0,
            sale_price_per_sqm: 1e300,
            plot_price: f64::MAX,
            misc_costs_percent: 1e300,
            ..ProjectInputs::default()
        };
        let tiny_revenue = ProjectInputs {
            plot_size: 1e-200,
            building_coefficient: 1e-100,
            construction_cost_per_sqm: 1.0,
            sale_price_per_sqm: 1e-10,
            plot_price: 1e300,
            misc_costs_percent: 0.0,
            ..ProjectInputs::default()
        };
        for inputs in [huge, tiny_revenue] {
            let res = calculate(&inputs);
            for v in [
                res.max_buildable_area,
                res.construction_cost_total,
                res.misc_costs_value,
                res.construction_cost_total_incl_plot,
                res.revenue_total,
                res.profit_total,
                res.profit_margin,
                res.roi,
                res.cost_per_sqm_incl_plot,
            ] {
                assert!(v.is_finite(), "{inputs:?} -> {res:?}");
            }
        }
    }

    #[test]
    fn clear_state_yields_zero_results() {
        let res = calculate(&ProjectInputs::empty());
        assert_eq!(res, CalculationResults::default());
    }

    #[test]
    fn negative_plot_size_passes_through() {
        let inputs = ProjectInputs {
            plot_size: -100.0,
            ..ProjectInputs::default()
        };
        let res = calculate(&inputs);
        assert!(res.max_buildable_area < 0.0);
        assert!(res.construction_cost_total < 0.0);
        assert_eq!(res.cost_per_sqm_incl_plot, 0.0);
        assert_eq!(res.profit_margin, 0.0);
    }

    #[test]
    fn toml_without_owner_notes_uses_none() {
        let src = r#"
location = "Chania"
plot_size = 300.0
plot_price = 90000.0
building_coefficient = 1.2
construction_cost_per_sqm = 1500.0
sale_price_per_sqm = 3000.0
misc_costs_percent = 4.0
"#;
        let inputs: ProjectInputs = toml::from_str(src).expect("parse");
        assert_eq!(inputs.owner_notes, None);
        assert_eq!(inputs.location, "Chania");
    }
}
