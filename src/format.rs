//! 금액/면적/비율 표시 형식.

/// 천 단위 구분 쉼표를 넣어 고정 소수 자리로 표시한다.
pub fn grouped(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let body = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body.as_str(), None),
    };
    let mut out = String::with_capacity(body.len() + int_part.len() / 3 + 1);
    let digits = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(f);
    }
    let is_zero = body.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        out.insert(0, '-');
    }
    out
}

/// 유로 금액(소수 없음). 예: `€1,680,000`, `-€397,500`
pub fn currency(value: f64) -> String {
    let g = grouped(value, 0);
    match g.strip_prefix('-') {
        Some(rest) => format!("-€{rest}"),
        None => format!("€{g}"),
    }
}

/// 소수 없는 구분 숫자
pub fn number(value: f64) -> String {
    grouped(value, 0)
}

pub fn area(value: f64) -> String {
    format!("{} m²", grouped(value, 0))
}

pub fn percent(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}
