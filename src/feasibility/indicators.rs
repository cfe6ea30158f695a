//! 결과 화면의 게이지/위험도 막대/원가 구성비를 계산한다.

use super::calculator::{CalculationResults, ProjectInputs};

/// 강도 게이지가 표시하는 이익률 하한 [%]
pub const GAUGE_MIN_MARGIN: f64 = -5.0;
/// 강도 게이지가 표시하는 이익률 상한 [%]
pub const GAUGE_MAX_MARGIN: f64 = 35.0;
/// 이 이익률 이상이면 위험도 0%
pub const RISK_FREE_MARGIN: f64 = 30.0;
/// 위험도 막대의 최소 표시 폭 [%]
pub const RISK_MIN_VISUAL_WIDTH: f64 = 5.0;

/// 총 투자비 대비 항목별 비율 [%].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostShares {
    pub plot: f64,
    pub construction: f64,
    pub misc: f64,
}

/// 대지/공사/예비비가 총 투자비에서 차지하는 비율을 구한다.
/// 총액이 정확히 0이면 분모를 1로 둔다.
pub fn cost_shares(inputs: &ProjectInputs, results: &CalculationResults) -> CostShares {
    let total = if results.construction_cost_total_incl_plot == 0.0 {
        1.0
    } else {
        results.construction_cost_total_incl_plot
    };
    CostShares {
        plot: inputs.plot_price / total * 100.0,
        construction: results.construction_cost_total / total * 100.0,
        misc: results.misc_costs_value / total * 100.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthGrade {
    Excellent,
    VeryGood,
    Good,
    Moderate,
    HighRisk,
}

impl StrengthGrade {
    pub fn key(&self) -> &'static str {
        match self {
            StrengthGrade::Excellent => "grade.excellent",
            StrengthGrade::VeryGood => "grade.very_good",
            StrengthGrade::Good => "grade.good",
            StrengthGrade::Moderate => "grade.moderate",
            StrengthGrade::HighRisk => "grade.high_risk",
        }
    }
}

/// 이익률 강도 게이지.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginStrength {
    /// 게이지 위치(0~100)
    pub position: f64,
    pub grade: StrengthGrade,
}

/// 그리스 건축 사업의 현실적인 이익률 범위(-5%~35%)를 0~100 게이지로 옮긴다.
pub fn margin_strength(margin: f64) -> MarginStrength {
    let raw = (margin - GAUGE_MIN_MARGIN) / (GAUGE_MAX_MARGIN - GAUGE_MIN_MARGIN) * 100.0;
    let position = raw.clamp(0.0, 100.0);
    let grade = if margin >= 25.0 {
        StrengthGrade::Excellent
    } else if margin >= 18.0 {
        StrengthGrade::VeryGood
    } else if margin >= 12.0 {
        StrengthGrade::Good
    } else if margin >= 5.0 {
        StrengthGrade::Moderate
    } else {
        StrengthGrade::HighRisk
    };
    MarginStrength { position, grade }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskGrade {
    Minimal,
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskGrade {
    pub fn key(&self) -> &'static str {
        match self {
            RiskGrade::Minimal => "risk.minimal",
            RiskGrade::Low => "risk.low",
            RiskGrade::Moderate => "risk.moderate",
            RiskGrade::High => "risk.high",
            RiskGrade::Critical => "risk.critical",
        }
    }
}

/// 추정 위험도.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLevel {
    /// 위험도(0~100) [%]
    pub percent: f64,
    pub grade: RiskGrade,
}

impl RiskLevel {
    /// 막대 표시 폭. 색이 보이도록 최소 5%를 유지한다.
    pub fn visual_width(&self) -> f64 {
        self.percent.max(RISK_MIN_VISUAL_WIDTH)
    }
}

/// 이익률로 위험도를 추정한다. 30% 이상이면 0, 0% 이하이면 100.
pub fn risk_level(margin: f64) -> RiskLevel {
    let percent = if margin >= RISK_FREE_MARGIN {
        0.0
    } else if margin <= 0.0 {
        100.0
    } else {
        100.0 - (margin / RISK_FREE_MARGIN) * 100.0
    };
    let grade = if percent < 10.0 {
        RiskGrade::Minimal
    } else if percent < 30.0 {
        RiskGrade::Low
    } else if percent < 60.0 {
        RiskGrade::Moderate
    } else if percent < 80.0 {
        RiskGrade::High
    } else {
        RiskGrade::Critical
    };
    RiskLevel { percent, grade }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feasibility::calculate;

    #[test]
    fn shares_of_baseline_sum_to_hundred() {
        let inputs = ProjectInputs::default();
        let res = calculate(&inputs);
        let s = cost_shares(&inputs, &res);
        assert!((s.plot + s.construction + s.misc - 100.0).abs() < 1e-9);
        assert!((s.plot - 150_000.0 / 913_500.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn shares_of_empty_inputs_are_zero() {
        let inputs = ProjectInputs::empty();
        let s = cost_shares(&inputs, &calculate(&inputs));
        assert_eq!(s, CostShares { plot: 0.0, construction: 0.0, misc: 0.0 });
    }

    #[test]
    fn gauge_position_is_clamped() {
        assert_eq!(margin_strength(-40.0).position, 0.0);
        assert_eq!(margin_strength(80.0).position, 100.0);
        assert!((margin_strength(15.0).position - 50.0).abs() < 1e-9);
    }

    #[test]
    fn gauge_grade_thresholds() {
        assert_eq!(margin_strength(25.0).grade, StrengthGrade::Excellent);
        assert_eq!(margin_strength(24.9).grade, StrengthGrade::VeryGood);
        assert_eq!(margin_strength(18.0).grade, StrengthGrade::VeryGood);
        assert_eq!(margin_strength(12.0).grade, StrengthGrade::Good);
        assert_eq!(margin_strength(5.0).grade, StrengthGrade::Moderate);
        assert_eq!(margin_strength(4.99).grade, StrengthGrade::HighRisk);
    }

    #[test]
    fn risk_bounds_and_grades() {
        assert_eq!(risk_level(45.0).percent, 0.0);
        assert_eq!(risk_level(45.0).grade, RiskGrade::Minimal);
        assert_eq!(risk_level(-10.0).percent, 100.0);
        assert_eq!(risk_level(0.0).grade, RiskGrade::Critical);
        let mid = risk_level(15.0);
        assert!((mid.percent - 50.0).abs() < 1e-9);
        assert_eq!(mid.grade, RiskGrade::Moderate);
        assert_eq!(risk_level(24.0).grade, RiskGrade::Low);
        assert_eq!(risk_level(9.0).grade, RiskGrade::High);
    }

    #[test]
    fn risk_bar_keeps_minimum_width() {
        assert_eq!(risk_level(40.0).visual_width(), RISK_MIN_VISUAL_WIDTH);
        assert_eq!(risk_level(-1.0).visual_width(), 100.0);
    }
}
