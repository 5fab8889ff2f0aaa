use validator::ValidateEmail;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// URL-friendly slug: lowercase ASCII alphanumerics joined by single hyphens.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for c in input.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Slug suffixed with a short random tail, for names that need not be unique.
pub fn unique_slug(input: &str) -> String {
    let base = slugify(input);
    let tail = &uuid::Uuid::new_v4().simple().to_string()[..6];
    if base.is_empty() {
        tail.to_string()
    } else {
        format!("{base}-{tail}")
    }
}

/// Accepted upload types for receipts and store documents.
pub fn is_document_content_type(content_type: &str) -> bool {
    is_image_content_type(content_type) || content_type == "application/pdf"
}

pub fn is_image_content_type(content_type: &str) -> bool {
    matches!(content_type, "image/png" | "image/jpeg" | "image/webp")
}
