/// Authentication utilities
///
/// Taskhive delegates authentication to an external identity provider; the
/// only primitive needed here is verification of the provider's signed
/// tokens.
///
/// # Modules
///
/// - [`identity`]: identity token validation and the `Identity` actor context
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::auth::identity::{validate_identity_token, Identity};
///
/// # fn example(token: &str, secret: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let claims = validate_identity_token(token, secret)?;
/// let identity = Identity::from(claims);
/// println!("authenticated as {}", identity.email);
/// # Ok(())
/// # }
/// ```

pub mod identity;
