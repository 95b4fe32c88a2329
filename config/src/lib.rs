pub mod paths;
pub mod settings;

pub use paths::PathManager;
pub use settings::Settings;

/// Load environment variables from .env files.
///
/// `dotenv` never overwrites a variable that is already set, so the project
/// file (./.env) is loaded first and wins over ~/.env. Variables exported in
/// the real environment win over both.
/// Call this before parsing CLI args to ensure env vars are available.
pub fn load_env_file() {
    dotenv::dotenv().ok();

    if let Some(home) = dirs::home_dir() {
        let home_env_path = home.join(".env");
        dotenv::from_path(home_env_path).ok();
    }
}
