//! Consumer-intent classification of normalized listings.

pub mod classifier;
pub mod client;

pub use classifier::{Classifier, IntentSignals};
pub use client::{ChatRequest, CompletionClient, Message, OpenAiClient};
