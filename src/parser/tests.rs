mod tests_expressions;
mod tests_position;
mod tests_statements;
