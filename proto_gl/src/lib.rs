pub mod core;
pub mod prelude;

#[cfg(test)]
mod tests;
