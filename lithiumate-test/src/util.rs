pub trait PrettyDisplay {
    fn pretty(&self) -> String;
}

impl PrettyDisplay for f32 {
    /// At most 3 decimals, without trailing zeros.
    fn pretty(&self) -> String {
        if !self.is_finite() {
            return self.to_string();
        }
        let text = format!("{self:.3}");
        let text = text.trim_end_matches('0').trim_end_matches('.');
        match text {
            "-0" => "0".into(),
            _ => text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty() {
        assert_eq!(52.8f32.pretty(), "52.8");
        assert_eq!(3.3f32.pretty(), "3.3");
        assert_eq!(1.0f32.pretty(), "1");
        assert_eq!(0.0f32.pretty(), "0");
        assert_eq!(100.0f32.pretty(), "100");
        assert_eq!((-0.0001f32).pretty(), "0");
        assert_eq!(6553.5f32.pretty(), "6553.5");
    }
}
