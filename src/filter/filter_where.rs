use serde_json::Value;

use super::error::FilterError;
use super::filter::Filter;
use super::types::{FilterOp, FilterWhereInfo, FilterWhereOptions};

pub struct FilterWhere<'a> {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<String>,
    options: &'a FilterWhereOptions,
}

impl<'a> FilterWhere<'a> {
    fn new(starting_param_index: usize, options: &'a FilterWhereOptions) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
            options,
        }
    }

    /// Returns the predicate and its bound values. Placeholders start at
    /// `starting_param_index + 1`.
    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        options: &FilterWhereOptions,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = FilterWhere::new(starting_param_index, options);
        filter_where.parse_where_data(where_data)?;
        let where_clause = if filter_where.conditions.is_empty() {
            "1=1".to_string()
        } else {
            filter_where.conditions.join(" AND ")
        };
        Ok((where_clause, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null => Ok(()),
            Value::Object(obj) => {
                for (key, value) in obj {
                    if key.starts_with('$') {
                        self.parse_logical_operator(key, value)?;
                    } else {
                        Filter::validate_identifier(key)?;
                        self.parse_field_condition(key, value)?;
                    }
                }
                Ok(())
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<(), FilterError> {
        let joiner = match FilterOp::from_key(op) {
            Some(FilterOp::And) => " AND ",
            Some(FilterOp::Or) => " OR ",
            _ => return Err(FilterError::UnsupportedOperator(op.to_string())),
        };
        let arr = value
            .as_array()
            .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
        if arr.is_empty() {
            return Ok(());
        }

        let mut sql_parts = Vec::with_capacity(arr.len());
        for clause in arr {
            let (sql, params) = FilterWhere::generate(clause, self.param_index, self.options)?;
            self.param_index += params.len();
            self.param_values.extend(params);
            sql_parts.push(format!("({})", sql));
        }
        self.conditions.push(format!("({})", sql_parts.join(joiner)));
        Ok(())
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => {
                for (op_key, op_val) in obj {
                    let operator = match FilterOp::from_key(op_key) {
                        Some(op) if !matches!(op, FilterOp::And | FilterOp::Or) => op,
                        _ => return Err(FilterError::UnsupportedOperator(op_key.clone())),
                    };
                    let info = FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() };
                    let sql = self.build_sql_condition(&info)?;
                    self.conditions.push(sql);
                }
            }
            _ => {
                // Implicit equality: { field: value }
                let info = FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() };
                let sql = self.build_sql_condition(&info)?;
                self.conditions.push(sql);
            }
        }
        Ok(())
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", condition.column);
        let cast = self.options.cast_for(&condition.column);
        let data = &condition.data;

        let sql = match condition.operator {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", quoted_column),
            FilterOp::Eq => format!("{} = {}", quoted_column, self.param(data.clone(), cast)),
            FilterOp::Ne if data.is_null() => format!("{} IS NOT NULL", quoted_column),
            FilterOp::Ne => format!("{} IS DISTINCT FROM {}", quoted_column, self.param(data.clone(), cast)),
            FilterOp::Gt => format!("{} > {}", quoted_column, self.scalar_param(condition, cast)?),
            FilterOp::Gte => format!("{} >= {}", quoted_column, self.scalar_param(condition, cast)?),
            FilterOp::Lt => format!("{} < {}", quoted_column, self.scalar_param(condition, cast)?),
            FilterOp::Lte => format!("{} <= {}", quoted_column, self.scalar_param(condition, cast)?),
            FilterOp::In | FilterOp::NIn => {
                let values = Self::as_list(data);
                let negate = condition.operator == FilterOp::NIn;
                if values.is_empty() {
                    return Ok(if negate { "1=1".to_string() } else { "1=0".to_string() });
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(v, cast)).collect();
                let keyword = if negate { "NOT IN" } else { "IN" };
                format!("{} {} ({})", quoted_column, keyword, params.join(", "))
            }
            FilterOp::Any => {
                let values = Self::as_list(data);
                if values.is_empty() {
                    return Ok("1=0".to_string());
                }
                let element_cast = cast.map(|c| c.trim_end_matches("[]")).or(Some("text"));
                let params: Vec<String> = values.into_iter().map(|v| self.param(v, element_cast)).collect();
                format!("{} && ARRAY[{}]", quoted_column, params.join(", "))
            }
            FilterOp::And | FilterOp::Or => {
                return Err(FilterError::UnsupportedOperator(format!("{:?} is not a field operator", condition.operator)));
            }
        };
        Ok(sql)
    }

    fn scalar_param(&mut self, condition: &FilterWhereInfo, cast: Option<&'static str>) -> Result<String, FilterError> {
        match condition.data {
            Value::Array(_) | Value::Object(_) | Value::Null => Err(FilterError::InvalidOperatorData(format!(
                "{:?} on \"{}\" requires a scalar value",
                condition.operator, condition.column
            ))),
            _ => Ok(self.param(condition.data.clone(), cast)),
        }
    }

    fn as_list(data: &Value) -> Vec<Value> {
        match data {
            Value::Array(values) => values.clone(),
            Value::Null => vec![],
            other => vec![other.clone()],
        }
    }

    fn param(&mut self, value: Value, cast: Option<&str>) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        match cast {
            Some(cast) => format!("${}::{}", self.param_index, cast),
            None => format!("${}", self.param_index),
        }
    }
}
