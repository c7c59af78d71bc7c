/// Loads `.env` from the working directory (or its parents) into the process environment.
/// Variables already set in the environment take precedence.
pub fn load() {
    // Every variable a .env could set has a flag or a default, so a missing file is fine.
    dotenv::dotenv().ok();
}
