// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums, and traits that define the core
// concepts of the translation system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A source/target sentence pair from a parallel corpus
pub mod translation_pair;

// Reserved token ids shared by the tokenizers, dataset and decoder
pub mod tokens;

// Typed errors for the two checked conditions
pub mod errors;

// Core abstractions (traits) that other layers implement
pub mod traits;
