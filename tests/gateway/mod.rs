//! End-to-end delivery properties: every test drives the real gateway,
//! dispatcher, and services over in-memory storage.

mod messaging_tests;
mod moderation_tests;
mod typing_tests;
