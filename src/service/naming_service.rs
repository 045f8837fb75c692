/// Builds the standardized display filename for a stored model file:
/// `Name_Method_Color_shortid.ext`.
///
/// The student name keeps only ASCII alphabetic characters, method and
/// color are title-cased per underscore- or space-separated token, the
/// short id and the original extension are lower-cased. Deterministic
/// and side-effect free.
pub fn standardized_name(
    student_name: &str,
    print_method: &str,
    color: &str,
    short_id: &str,
    original_filename: &str,
) -> String {
    let name: String = student_name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    let stem = format!(
        "{}_{}_{}_{}",
        name,
        title_case_tokens(print_method),
        title_case_tokens(color),
        short_id.to_ascii_lowercase()
    );
    match original_filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{stem}.{}", ext.to_ascii_lowercase()),
        _ => stem,
    }
}

fn title_case_tokens(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_canonical_shape() {
        let name = standardized_name("John O'Brien", "filament", "true_red", "ab12cd", "Model.STL");
        assert_eq!(name, "JohnOBrien_Filament_TrueRed_ab12cd.stl");
    }

    #[test]
    fn is_deterministic() {
        let a = standardized_name("Jane Doe", "resin", "clear", "B7", "part.obj");
        let b = standardized_name("Jane Doe", "resin", "clear", "B7", "part.obj");
        assert_eq!(a, b);
        assert_eq!(a, "JaneDoe_Resin_Clear_b7.obj");
    }

    #[test]
    fn strips_digits_and_punctuation_from_name() {
        let name = standardized_name("Mary-Jane 2nd", "filament", "blue", "A1", "x.3mf");
        assert!(name.starts_with("MaryJanend_"));
    }

    #[test]
    fn title_cases_multi_token_colors() {
        assert_eq!(title_case_tokens("TRUE_RED"), "TrueRed");
        assert_eq!(title_case_tokens("glow in dark"), "GlowInDark");
        assert_eq!(title_case_tokens("filament"), "Filament");
    }

    #[test]
    fn keeps_extension_lowercase() {
        let name = standardized_name("Ann Lee", "filament", "black", "C3", "TOWER.OBJ");
        assert!(name.ends_with(".obj"));
    }

    #[test]
    fn no_extension_yields_bare_stem() {
        let name = standardized_name("Ann Lee", "filament", "black", "C3", "tower");
        assert_eq!(name, "AnnLee_Filament_Black_c3");
    }
}
