//! Email address validation and normalization.

/// Longest local part RFC 5321 allows.
const MAX_LOCAL_PART_LEN: usize = 64;
/// Longest domain RFC 1035 allows.
const MAX_DOMAIN_LEN: usize = 253;
/// Longest domain label RFC 1035 allows.
const MAX_LABEL_LEN: usize = 63;

/// Validation error for an email address or domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Address is empty.
    EmptyAddress,
    /// Address does not contain exactly one `@`.
    MissingAtSign,
    /// Local part is empty.
    EmptyLocalPart,
    /// Local part is longer than 64 characters.
    LocalPartTooLong,
    /// Local part contains characters that are not allowed.
    InvalidLocalPart,
    /// Domain is empty.
    EmptyDomain,
    /// Domain is not a valid host name.
    InvalidDomain,
    /// Domain is not one the service accepts.
    UnsupportedDomain,
    /// The service rejected the address.
    RejectedByService,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyAddress => "Email address is required",
            Self::MissingAtSign => "Email address must contain a single @",
            Self::EmptyLocalPart => "Email address needs a name before the @",
            Self::LocalPartTooLong => "Name before the @ must be at most 64 characters",
            Self::InvalidLocalPart => "Name before the @ contains invalid characters",
            Self::EmptyDomain => "Email address needs a domain after the @",
            Self::InvalidDomain => "Invalid email domain",
            Self::UnsupportedDomain => "Email domain is not supported",
            Self::RejectedByService => "Email address was rejected by the service",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyAddress | Self::MissingAtSign | Self::RejectedByService => "email_address",
            Self::EmptyLocalPart | Self::LocalPartTooLong | Self::InvalidLocalPart => "local_part",
            Self::EmptyDomain | Self::InvalidDomain | Self::UnsupportedDomain => "domain",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Trims and lowercases an address.
#[must_use]
pub fn normalize_email_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Validates an address and returns its normalized form.
///
/// # Errors
///
/// Returns the first problem found with the address.
pub fn validate_email_address(address: &str) -> Result<String, ValidationError> {
    let normalized = normalize_email_address(address);
    if normalized.is_empty() {
        return Err(ValidationError::EmptyAddress);
    }

    let Some((local, domain)) = normalized.split_once('@') else {
        return Err(ValidationError::MissingAtSign);
    };
    if domain.contains('@') {
        return Err(ValidationError::MissingAtSign);
    }

    validate_local_part(local)?;
    validate_domain(domain)?;
    Ok(normalized)
}

/// Validates the part of an address before the `@`.
///
/// # Errors
///
/// Returns an error if the local part is empty, too long or malformed.
pub fn validate_local_part(local: &str) -> Result<(), ValidationError> {
    if local.is_empty() {
        return Err(ValidationError::EmptyLocalPart);
    }
    if local.chars().count() > MAX_LOCAL_PART_LEN {
        return Err(ValidationError::LocalPartTooLong);
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return Err(ValidationError::InvalidLocalPart);
    }
    if !local.chars().all(is_atext_or_dot) {
        return Err(ValidationError::InvalidLocalPart);
    }
    Ok(())
}

/// Validates a domain name.
///
/// # Errors
///
/// Returns an error if the domain is empty or not a valid host name with at
/// least two labels.
pub fn validate_domain(domain: &str) -> Result<(), ValidationError> {
    if domain.is_empty() {
        return Err(ValidationError::EmptyDomain);
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(ValidationError::InvalidDomain);
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(ValidationError::InvalidDomain);
    }

    let valid = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidDomain)
    }
}

/// Domain part of a normalized address.
#[must_use]
pub fn domain_of(address: &str) -> &str {
    address.rsplit_once('@').map_or("", |(_, domain)| domain)
}

/// Validates an address, mapping failures to [`crate::Error::InvalidEmailAddress`].
pub(crate) fn require_valid_address(address: &str) -> crate::Result<String> {
    validate_email_address(address).map_err(|reason| crate::Error::InvalidEmailAddress {
        address: address.to_string(),
        reason,
    })
}

/// RFC 5322 `atext` plus dot.
fn is_atext_or_dot(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~.".contains(c)
}
