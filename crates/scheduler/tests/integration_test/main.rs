/// Integration tests for the frame scheduler covering priority selection,
/// ordered and unordered draining, frame budgets, queue lifecycle, and
/// concurrent producers.

mod config;
mod helpers;
mod lifecycle;
mod ordering;
mod priority;
