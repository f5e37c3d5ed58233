pub mod access;
pub mod accounts;
pub mod http;
pub mod listings;
pub mod store;
pub mod subscriptions;
pub mod uploads;

#[cfg(test)]
pub(crate) mod test_support;
