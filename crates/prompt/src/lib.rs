//! Prompt assembly for the FSI assistant.
//!
//! Every assistant mode has a built-in prompt definition (a persona for the
//! system turn and a Handlebars template for the human turn). A workspace may
//! override any of them with `.fsi/prompts/<id>.yml`.

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{assemble_prompt, build_prompt};
pub use defaults::{builtin_prompt, prompt_id};
pub use loader::{list_prompts, load_prompt, resolve_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
