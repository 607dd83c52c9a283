#[cfg(test)]
mod test_models;
