//! Dataset Attribute Structure (`.das`) parsing.

use std::collections::HashMap;

use crate::error::{OpendapError, OpendapResult};
use crate::lexer::{tokenize, Token, TokenStream};

/// One attribute: its declared type and raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub dap_type: String,
    pub values: Vec<String>,
}

impl Attribute {
    pub fn as_str(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_str().and_then(|v| v.parse().ok())
    }
}

/// Attributes keyed by container (variable) name, then attribute name.
///
/// Nested containers are flattened with dotted names (`outer.inner`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Das {
    containers: HashMap<String, HashMap<String, Attribute>>,
}

impl Das {
    pub fn parse(text: &str) -> OpendapResult<Self> {
        let mut stream = TokenStream::new(tokenize(text)?);
        if !stream.eat_keyword("Attributes") {
            return Err(OpendapError::Parse("DAS must start with 'Attributes'".to_string()));
        }
        stream.expect_symbol('{')?;

        let mut das = Das::default();
        while !stream.is_symbol('}') {
            let name = stream.expect_word()?;
            parse_container(&mut stream, &name, &mut das.containers)?;
        }
        stream.expect_symbol('}')?;
        Ok(das)
    }

    pub fn get(&self, container: &str, attribute: &str) -> Option<&Attribute> {
        self.containers.get(container).and_then(|c| c.get(attribute))
    }

    pub fn container(&self, name: &str) -> Option<&HashMap<String, Attribute>> {
        self.containers.get(name)
    }

    /// Fill value of a variable, from `_FillValue` or `missing_value`.
    pub fn fill_value(&self, variable: &str) -> Option<f64> {
        self.get(variable, "_FillValue")
            .or_else(|| self.get(variable, "missing_value"))
            .and_then(Attribute::as_f64)
    }
}

fn parse_container(
    stream: &mut TokenStream,
    name: &str,
    containers: &mut HashMap<String, HashMap<String, Attribute>>,
) -> OpendapResult<()> {
    stream.expect_symbol('{')?;
    let mut attributes = HashMap::new();

    while !stream.is_symbol('}') {
        let first = stream.expect_word()?;
        if stream.is_symbol('{') {
            parse_container(stream, &format!("{}.{}", name, first), containers)?;
            continue;
        }

        let attr_name = stream.expect_word()?;
        let mut values = Vec::new();
        loop {
            match stream.next() {
                Some(Token::Word(v)) | Some(Token::Quoted(v)) => values.push(v),
                Some(Token::Symbol(',')) => {}
                Some(Token::Symbol(';')) => break,
                other => {
                    return Err(OpendapError::Parse(format!(
                        "unexpected token {:?} in attribute {}.{}",
                        other, name, attr_name
                    )))
                }
            }
        }
        attributes.insert(
            attr_name,
            Attribute {
                dap_type: first,
                values,
            },
        );
    }
    stream.expect_symbol('}')?;

    containers.insert(name.to_string(), attributes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GFS_DAS: &str = r#"Attributes {
    time {
        String grads_dim "t";
        String grads_mapping "linear";
        String grads_size "121";
        String grads_min "00z15jan2024";
        String grads_step "1hr";
        String units "days since 1-1-1 00:00:0.0";
        String long_name "time";
        Float64 minimum 738901.0;
        Float64 maximum 738906.0;
        Float64 resolution 0.041666668;
    }
    pratesfc {
        Float32 _FillValue 9.999E20;
        Float32 missing_value 9.999E20;
        String long_name "** surface precipitation rate [kg/m^2/s] ";
    }
    NC_GLOBAL {
        String title "GFS 0.25 deg starting from 00Z15jan2024, downloaded Jan 15 04:36 UTC";
        Float32 history 1.0, 2.0;
    }
}
"#;

    #[test]
    fn test_parse_grads_das() {
        let das = Das::parse(GFS_DAS).unwrap();
        assert_eq!(
            das.get("time", "units").and_then(Attribute::as_str),
            Some("days since 1-1-1 00:00:0.0")
        );
        assert_eq!(das.get("time", "minimum").and_then(Attribute::as_f64), Some(738901.0));
        assert_eq!(das.fill_value("pratesfc"), Some(9.999e20));
        assert_eq!(das.get("NC_GLOBAL", "history").unwrap().values.len(), 2);
    }

    #[test]
    fn test_missing_attribute() {
        let das = Das::parse(GFS_DAS).unwrap();
        assert!(das.get("lat", "units").is_none());
        assert!(das.fill_value("time").is_none());
    }

    #[test]
    fn test_nested_container() {
        let das = Das::parse("Attributes { outer { inner { Int32 n 3; } String s \"x\"; } }").unwrap();
        assert_eq!(das.get("outer.inner", "n").and_then(Attribute::as_f64), Some(3.0));
        assert_eq!(das.get("outer", "s").and_then(Attribute::as_str), Some("x"));
    }
}
