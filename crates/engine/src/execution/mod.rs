mod collector;
mod executor;

pub(crate) use executor::execute;
