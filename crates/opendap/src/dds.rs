//! Dataset Descriptor Structure (`.dds`) parsing.

use crate::error::{OpendapError, OpendapResult};
use crate::lexer::{tokenize, TokenStream};

/// DAP2 base types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DapType {
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
    String,
    Url,
}

impl DapType {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "byte" => Some(DapType::Byte),
            "int16" => Some(DapType::Int16),
            "uint16" => Some(DapType::UInt16),
            "int32" => Some(DapType::Int32),
            "uint32" => Some(DapType::UInt32),
            "float32" => Some(DapType::Float32),
            "float64" => Some(DapType::Float64),
            "string" => Some(DapType::String),
            "url" => Some(DapType::Url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub name: Option<String>,
    pub size: usize,
}

/// A base-type variable, scalar when `dims` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDecl {
    pub name: String,
    pub dap_type: DapType,
    pub dims: Vec<Dimension>,
}

impl ArrayDecl {
    pub fn len(&self) -> usize {
        self.dims.iter().map(|d| d.size).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dims.iter().map(|d| d.size).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Array(ArrayDecl),
    Grid { array: ArrayDecl, maps: Vec<ArrayDecl> },
    Structure { name: String, members: Vec<Declaration> },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Array(a) => &a.name,
            Declaration::Grid { array, .. } => &array.name,
            Declaration::Structure { name, .. } => name,
        }
    }

    /// The data-carrying array of a plain array or grid.
    pub fn array(&self) -> Option<&ArrayDecl> {
        match self {
            Declaration::Array(a) => Some(a),
            Declaration::Grid { array, .. } => Some(array),
            Declaration::Structure { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dds {
    pub name: String,
    pub declarations: Vec<Declaration>,
}

impl Dds {
    pub fn parse(text: &str) -> OpendapResult<Self> {
        let mut stream = TokenStream::new(tokenize(text)?);

        if !stream.eat_keyword("Dataset") {
            return Err(OpendapError::Parse("DDS must start with 'Dataset'".to_string()));
        }
        stream.expect_symbol('{')?;
        let declarations = parse_declarations(&mut stream)?;
        stream.expect_symbol('}')?;
        let name = stream.expect_word()?;
        stream.expect_symbol(';')?;

        Ok(Self { name, declarations })
    }

    pub fn find(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name() == name)
    }

    /// Names of all top-level grids and arrays.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.declarations.iter().map(|d| d.name())
    }
}

fn parse_declarations(stream: &mut TokenStream) -> OpendapResult<Vec<Declaration>> {
    let mut declarations = Vec::new();
    while !stream.is_symbol('}') {
        if stream.peek().is_none() {
            return Err(OpendapError::Parse("unexpected end of DDS".to_string()));
        }
        declarations.push(parse_declaration(stream)?);
    }
    Ok(declarations)
}

fn parse_declaration(stream: &mut TokenStream) -> OpendapResult<Declaration> {
    if stream.eat_keyword("Grid") {
        stream.expect_symbol('{')?;
        if !stream.eat_keyword("ARRAY") {
            return Err(OpendapError::Parse("Grid without ARRAY section".to_string()));
        }
        stream.expect_symbol(':')?;
        let array = parse_array(stream)?;
        if !stream.eat_keyword("MAPS") {
            return Err(OpendapError::Parse("Grid without MAPS section".to_string()));
        }
        stream.expect_symbol(':')?;
        let mut maps = Vec::new();
        while !stream.is_symbol('}') {
            maps.push(parse_array(stream)?);
        }
        stream.expect_symbol('}')?;
        let name = stream.expect_word()?;
        stream.expect_symbol(';')?;
        let array = ArrayDecl { name, ..array };
        return Ok(Declaration::Grid { array, maps });
    }

    if stream.eat_keyword("Structure") || stream.eat_keyword("Sequence") {
        stream.expect_symbol('{')?;
        let members = parse_declarations(stream)?;
        stream.expect_symbol('}')?;
        let name = stream.expect_word()?;
        stream.expect_symbol(';')?;
        return Ok(Declaration::Structure { name, members });
    }

    Ok(Declaration::Array(parse_array(stream)?))
}

fn parse_array(stream: &mut TokenStream) -> OpendapResult<ArrayDecl> {
    let type_word = stream.expect_word()?;
    let dap_type = DapType::from_keyword(&type_word)
        .ok_or_else(|| OpendapError::Parse(format!("unknown DAP type '{}'", type_word)))?;
    let name = stream.expect_word()?;

    let mut dims = Vec::new();
    while stream.is_symbol('[') {
        stream.next();
        let first = stream.expect_word()?;
        let dim = if stream.is_symbol('=') {
            stream.next();
            let size = stream.expect_word()?;
            Dimension {
                name: Some(first),
                size: parse_size(&size)?,
            }
        } else {
            Dimension {
                name: None,
                size: parse_size(&first)?,
            }
        };
        stream.expect_symbol(']')?;
        dims.push(dim);
    }
    stream.expect_symbol(';')?;

    Ok(ArrayDecl { name, dap_type, dims })
}

fn parse_size(word: &str) -> OpendapResult<usize> {
    word.parse()
        .map_err(|_| OpendapError::Parse(format!("invalid dimension size '{}'", word)))
}
