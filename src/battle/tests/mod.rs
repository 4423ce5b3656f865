pub mod common;




#[cfg(test)]
mod test_round_flow;
