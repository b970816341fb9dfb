pub mod constants;
pub mod form;
pub mod types;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;
