mod test_describe;
mod test_helpers;
