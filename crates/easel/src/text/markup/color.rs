use std::str::FromStr;

use palette::Srgba;

#[derive(Debug, thiserror::Error)]
pub enum ColorParseError {
    #[error("expected parenthesis after color type")]
    MissingParenthesis,
    #[error("unknown color type - expected one of `rgb`, `rgba`")]
    UnknownType,
    #[error(transparent)]
    BadValue(std::num::ParseIntError),
    #[error("expected {expected} color components but found {actual}")]
    ComponentMismatch { expected: usize, actual: usize },
}

/// Parses a color argument of the form `rgb(r, g, b)` or `rgba(r, g, b, a)`.
pub fn parse_color(s: &str) -> Result<Srgba<u8>, ColorParseError> {
    let (rest, expected) = if let Some(rest) = s.strip_prefix("rgba") {
        (rest, 4)
    } else if let Some(rest) = s.strip_prefix("rgb") {
        (rest, 3)
    } else {
        return Err(ColorParseError::UnknownType);
    };

    let components = parse_components(parenthesized(rest)?)?;
    match (expected, components.as_slice()) {
        (3, &[r, g, b]) => Ok(Srgba::new(r, g, b, u8::MAX)),
        (4, &[r, g, b, a]) => Ok(Srgba::new(r, g, b, a)),
        _ => Err(ColorParseError::ComponentMismatch {
            expected,
            actual: components.len(),
        }),
    }
}

fn parenthesized(s: &str) -> Result<&str, ColorParseError> {
    let s = s.trim();
    match (s.chars().next(), s.chars().last()) {
        (Some('('), Some(')')) if s.len() >= 2 => Ok(&s[1..s.len() - 1]),
        _ => Err(ColorParseError::MissingParenthesis),
    }
}

fn parse_components(s: &str) -> Result<Vec<u8>, ColorParseError> {
    s.split(',')
        .map(|part| u8::from_str(part.trim()).map_err(ColorParseError::BadValue))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rgb() {
        assert_eq!(
            parse_color("rgb(5, 10 ,235 )").unwrap(),
            Srgba::new(5, 10, 235, 255)
        );
    }

    #[test]
    fn parses_rgba() {
        assert_eq!(
            parse_color("rgba(235, 10,5,100)").unwrap(),
            Srgba::new(235, 10, 5, 100)
        );
    }

    #[test]
    fn rejects_component_count_mismatch() {
        assert!(matches!(
            parse_color("rgb(235,100,20,40)"),
            Err(ColorParseError::ComponentMismatch {
                expected: 3,
                actual: 4
            })
        ));
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(matches!(
            parse_color("hsl(1,2,3)"),
            Err(ColorParseError::UnknownType)
        ));
    }

    #[test]
    fn rejects_missing_parenthesis() {
        assert!(matches!(
            parse_color("rgb 1,2,3"),
            Err(ColorParseError::MissingParenthesis)
        ));
    }
}
