mod config_sections;
mod failure_window;
mod file_backed;
mod lifecycle_invariants;
mod progress;
