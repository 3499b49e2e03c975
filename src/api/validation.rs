use super::ApiError;

pub fn validate_content_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid content ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_subgenre_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Subgenre name cannot be empty"));
    }

    if trimmed.len() > 50 {
        return Err(ApiError::validation(
            "Subgenre name must be 50 characters or less",
        ));
    }

    Ok(trimmed)
}

pub fn validate_slug(slug: &str) -> Result<&str, ApiError> {
    if slug.is_empty() {
        return Err(ApiError::validation("Slug cannot be empty"));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ApiError::validation(
            "Slug can only contain lowercase letters, digits, and hyphens",
        ));
    }

    Ok(slug)
}

pub fn slug_from_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

pub fn validate_message(message: &str, what: &str) -> Result<String, ApiError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{what} cannot be empty")));
    }
    if trimmed.len() > 4000 {
        return Err(ApiError::validation(format!(
            "{what} must be 4000 characters or less"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_content_id() {
        assert!(validate_content_id(1).is_ok());
        assert!(validate_content_id(12345).is_ok());
        assert!(validate_content_id(0).is_err());
        assert!(validate_content_id(-1).is_err());
    }

    #[test]
    fn test_validate_subgenre_name() {
        assert!(validate_subgenre_name("Slasher").is_ok());
        assert_eq!(validate_subgenre_name("  Folk Horror  ").unwrap(), "Folk Horror");
        assert!(validate_subgenre_name("").is_err());
        assert!(validate_subgenre_name(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("found-footage").is_ok());
        assert!(validate_slug("giallo2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Found Footage").is_err());
    }

    #[test]
    fn test_slug_from_name() {
        assert_eq!(slug_from_name("Found Footage"), "found-footage");
        assert_eq!(slug_from_name("Sci-Fi Horror"), "sci-fi-horror");
        assert_eq!(slug_from_name("Body  Horror!"), "body-horror");
    }
}
