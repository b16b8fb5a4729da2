mod loader;
mod portal;

pub use loader::{load_attempts_from_json, load_quizzes_from_json, LoadError};
