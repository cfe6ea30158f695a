//! 사용자 입력 문자열 해석과 입력값 경고.

use super::calculator::ProjectInputs;
use crate::i18n::Translator;

/// 입력 필드 식별자.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputField {
    PlotSize,
    PlotPrice,
    BuildingCoefficient,
    ConstructionCostPerSqm,
    SalePricePerSqm,
    MiscCostsPercent,
}

impl InputField {
    pub const ALL: [InputField; 6] = [
        InputField::PlotSize,
        InputField::PlotPrice,
        InputField::BuildingCoefficient,
        InputField::ConstructionCostPerSqm,
        InputField::SalePricePerSqm,
        InputField::MiscCostsPercent,
    ];

    /// 언어팩 키
    pub fn key(&self) -> &'static str {
        match self {
            InputField::PlotSize => "field.plot_size",
            InputField::PlotPrice => "field.plot_price",
            InputField::BuildingCoefficient => "field.building_coefficient",
            InputField::ConstructionCostPerSqm => "field.construction_cost",
            InputField::SalePricePerSqm => "field.sale_price",
            InputField::MiscCostsPercent => "field.misc_percent",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            InputField::PlotSize => "m²",
            InputField::PlotPrice => "€",
            InputField::BuildingCoefficient => "x",
            InputField::ConstructionCostPerSqm | InputField::SalePricePerSqm => "€/m²",
            InputField::MiscCostsPercent => "%",
        }
    }
}

impl ProjectInputs {
    pub fn get(&self, field: InputField) -> f64 {
        match field {
            InputField::PlotSize => self.plot_size,
            InputField::PlotPrice => self.plot_price,
            InputField::BuildingCoefficient => self.building_coefficient,
            InputField::ConstructionCostPerSqm => self.construction_cost_per_sqm,
            InputField::SalePricePerSqm => self.sale_price_per_sqm,
            InputField::MiscCostsPercent => self.misc_costs_percent,
        }
    }

    pub fn set(&mut self, field: InputField, value: f64) {
        let slot = match field {
            InputField::PlotSize => &mut self.plot_size,
            InputField::PlotPrice => &mut self.plot_price,
            InputField::BuildingCoefficient => &mut self.building_coefficient,
            InputField::ConstructionCostPerSqm => &mut self.construction_cost_per_sqm,
            InputField::SalePricePerSqm => &mut self.sale_price_per_sqm,
            InputField::MiscCostsPercent => &mut self.misc_costs_percent,
        };
        *slot = value;
    }

    /// 정상 범위를 벗어난 입력값을 알려준다. 계산이나 저장을 막지는 않는다.
    pub fn warnings(&self) -> Vec<InputWarning> {
        let mut out: Vec<InputWarning> = InputField::ALL
            .iter()
            .filter(|f| self.get(**f) < 0.0)
            .map(|f| InputWarning::Negative(*f))
            .collect();
        if self.misc_costs_percent > 100.0 {
            out.push(InputWarning::MiscPercentAboveHundred);
        }
        out
    }
}

/// 입력값 경고.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputWarning {
    /// 음수 입력(계산은 그대로 진행)
    Negative(InputField),
    /// 예비비 비율이 100% 초과
    MiscPercentAboveHundred,
}

impl InputWarning {
    pub fn key(&self) -> &'static str {
        match self {
            InputWarning::Negative(_) => "warning.negative",
            InputWarning::MiscPercentAboveHundred => "warning.misc_above_hundred",
        }
    }

    /// 현재 언어의 경고 문장. 음수 경고에는 필드 이름을 넣는다.
    pub fn text(&self, tr: &Translator) -> String {
        match self {
            InputWarning::Negative(field) => tr.tf(self.key(), &[("field", tr.t(field.key()))]),
            InputWarning::MiscPercentAboveHundred => tr.t(self.key()),
        }
    }
}

/// 숫자 입력 문자열을 관대하게 해석한다.
///
/// 공백, `€`, 천 단위 구분 공백을 제거하고 `.`이 없으면 `,`를 소수점으로 본다.
/// 해석할 수 없거나 유한하지 않은 값은 0으로 둔다(빈 칸 = 0 규칙).
pub fn parse_amount(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '€')
        .collect();
    let normalized = if cleaned.contains('.') {
        cleaned.replace(',', "")
    } else {
        cleaned.replace(',', ".")
    };
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
