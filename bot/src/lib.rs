pub mod aggregator;
pub mod api;
pub mod events;
pub mod messages;
pub mod notifier;
pub mod scheduler;
pub mod slot;
pub mod store;

#[cfg(test)]
mod tests;
