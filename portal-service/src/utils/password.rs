use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Hash a password with Argon2id default parameters. The PHC string embeds the
/// salt and parameters, so verification needs nothing else.
pub fn hash_password(password: &str) -> Result<String, anyhow::Error> {
    hash_with(&Argon2::default(), password)
}

/// Hash with explicit cost parameters (memory in KiB, iterations). Lets test
/// fixtures avoid paying the production cost on every login.
pub fn hash_password_with_cost(
    password: &str,
    memory_kib: u32,
    iterations: u32,
) -> Result<String, anyhow::Error> {
    let params = Params::new(memory_kib, iterations, 1, None)
        .map_err(|e| anyhow::anyhow!("Invalid argon2 parameters: {}", e))?;
    hash_with(
        &Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        password,
    )
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash itself is
/// unusable.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, anyhow::Error> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
