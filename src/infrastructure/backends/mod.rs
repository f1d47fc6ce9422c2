#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

pub mod claude;
pub mod gemini;

use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;

pub struct BackendManager {}

impl BackendManager {
    pub fn get(name: BackendName, api_key: &str) -> BackendBox {
        match name {
            BackendName::Claude => return Box::new(claude::Claude::new(api_key)),
            BackendName::Gemini => return Box::new(gemini::Gemini::new(api_key)),
        }
    }
}
