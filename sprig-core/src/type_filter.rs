//! 类型过滤器
//!
//! 组件扫描使用类型过滤器决定哪些候选类型成为 Bean 定义。内置四种过滤器：
//!
//! - [`AnnotationTypeFilter`] - 类型（直接或通过元注解）标注了指定注解
//! - [`AssignableTypeFilter`] - 类型可以赋值给指定类型
//! - [`RegexPatternTypeFilter`] - 完整类型名匹配正则表达式
//! - [`AspectJTypeFilter`] - 类型模式表达式，支持 `&&`、`||`、`!`
//!
//! 任何 `Fn(&TypeMetadata, &TypeCatalog) -> ContainerResult<bool>` 闭包也是过滤器。

use std::collections::HashSet;
use std::fmt;

use regex::Regex;

use crate::catalog::TypeCatalog;
use crate::error::{ContainerError, ContainerResult};
use crate::metadata::TypeMetadata;

/// 类型过滤器 trait
pub trait TypeFilter: Send + Sync {
    /// 候选类型是否匹配
    ///
    /// 过滤器可能需要通过目录解析其他类型，解析失败时返回错误
    fn matches(&self, metadata: &TypeMetadata, catalog: &TypeCatalog) -> ContainerResult<bool>;

    /// 用于日志的描述
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

impl<F> TypeFilter for F
where
    F: Fn(&TypeMetadata, &TypeCatalog) -> ContainerResult<bool> + Send + Sync,
{
    fn matches(&self, metadata: &TypeMetadata, catalog: &TypeCatalog) -> ContainerResult<bool> {
        self(metadata, catalog)
    }

    fn describe(&self) -> String {
        "custom type filter".to_string()
    }
}

/// 注解过滤器
#[derive(Debug, Clone)]
pub struct AnnotationTypeFilter {
    annotation_type: String,
    consider_meta_annotations: bool,
}

impl AnnotationTypeFilter {
    pub fn new(annotation_type: impl Into<String>) -> Self {
        Self {
            annotation_type: annotation_type.into(),
            consider_meta_annotations: true,
        }
    }

    /// 只匹配直接标注的注解
    pub fn direct_only(mut self) -> Self {
        self.consider_meta_annotations = false;
        self
    }

    pub fn annotation_type(&self) -> &str {
        &self.annotation_type
    }

    fn has_meta_annotation(
        &self,
        metadata: &TypeMetadata,
        catalog: &TypeCatalog,
        visited: &mut HashSet<String>,
    ) -> bool {
        metadata.annotations().iter().any(|annotation| {
            if !visited.insert(annotation.name().to_string()) {
                return false;
            }
            match catalog.metadata(annotation.name()) {
                Some(annotation_type) => {
                    annotation_type.has_annotation(&self.annotation_type)
                        || self.has_meta_annotation(&annotation_type, catalog, visited)
                }
                None => false,
            }
        })
    }
}

impl TypeFilter for AnnotationTypeFilter {
    fn matches(&self, metadata: &TypeMetadata, catalog: &TypeCatalog) -> ContainerResult<bool> {
        if metadata.has_annotation(&self.annotation_type) {
            return Ok(true);
        }
        if !self.consider_meta_annotations {
            return Ok(false);
        }

        let mut visited = HashSet::new();
        visited.insert(metadata.name().to_string());
        Ok(self.has_meta_annotation(metadata, catalog, &mut visited))
    }

    fn describe(&self) -> String {
        format!("annotation [{}]", self.annotation_type)
    }
}

/// 可赋值类型过滤器
#[derive(Debug, Clone)]
pub struct AssignableTypeFilter {
    target_type: String,
}

impl AssignableTypeFilter {
    pub fn new(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
        }
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }
}

impl TypeFilter for AssignableTypeFilter {
    fn matches(&self, metadata: &TypeMetadata, catalog: &TypeCatalog) -> ContainerResult<bool> {
        Ok(catalog.is_assignable(metadata, &self.target_type))
    }

    fn describe(&self) -> String {
        format!("assignable to [{}]", self.target_type)
    }
}

/// 正则表达式过滤器，整个类型名必须匹配
#[derive(Debug, Clone)]
pub struct RegexPatternTypeFilter {
    pattern: String,
    regex: Regex,
}

impl RegexPatternTypeFilter {
    pub fn new(pattern: &str) -> ContainerResult<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            ContainerError::Configuration(format!("Invalid regex type filter '{}': {}", pattern, e))
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl TypeFilter for RegexPatternTypeFilter {
    fn matches(&self, metadata: &TypeMetadata, _catalog: &TypeCatalog) -> ContainerResult<bool> {
        Ok(self.regex.is_match(metadata.name()))
    }

    fn describe(&self) -> String {
        format!("regex [{}]", self.pattern)
    }
}

/// 类型模式表达式
///
/// 语法：
/// - `example::scannable::*Service` - `*` 匹配一段名称中的任意字符
/// - `example..*Dao` - `..` 匹配任意层级的中间路径
/// - `example::BaseDao+` - 结尾的 `+` 同时匹配所有子类型
/// - `a && b`、`a || b`、`!a`、括号分组（也可以写作 `and`、`or`、`not`）
#[derive(Clone)]
enum TypePatternExpression {
    Pattern {
        source: String,
        regex: Regex,
        include_subtypes: bool,
    },
    And(Box<TypePatternExpression>, Box<TypePatternExpression>),
    Or(Box<TypePatternExpression>, Box<TypePatternExpression>),
    Not(Box<TypePatternExpression>),
}

impl TypePatternExpression {
    fn matches(&self, metadata: &TypeMetadata, catalog: &TypeCatalog) -> bool {
        match self {
            TypePatternExpression::Pattern {
                regex,
                include_subtypes,
                ..
            } => {
                regex.is_match(metadata.name())
                    || (*include_subtypes
                        && catalog
                            .supertype_closure(metadata)
                            .iter()
                            .any(|supertype| regex.is_match(supertype)))
            }
            TypePatternExpression::And(left, right) => {
                left.matches(metadata, catalog) && right.matches(metadata, catalog)
            }
            TypePatternExpression::Or(left, right) => {
                left.matches(metadata, catalog) || right.matches(metadata, catalog)
            }
            TypePatternExpression::Not(expr) => !expr.matches(metadata, catalog),
        }
    }
}

impl fmt::Debug for TypePatternExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypePatternExpression::Pattern {
                source,
                include_subtypes,
                ..
            } => {
                if *include_subtypes {
                    write!(f, "Pattern({}+)", source)
                } else {
                    write!(f, "Pattern({})", source)
                }
            }
            TypePatternExpression::And(l, r) => write!(f, "And({:?}, {:?})", l, r),
            TypePatternExpression::Or(l, r) => write!(f, "Or({:?}, {:?})", l, r),
            TypePatternExpression::Not(e) => write!(f, "Not({:?})", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    And,
    Or,
    Not,
    Open,
    Close,
    Pattern(String),
}

fn is_pattern_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | ':' | '*' | '.' | '+')
}

fn tokenize(expression: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '!' => {
                chars.next();
                tokens.push(Token::Not);
            }
            '&' | '|' => {
                chars.next();
                if chars.next() != Some(c) {
                    return Err(format!("expected '{}{}'", c, c));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            c if is_pattern_char(c) => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_pattern_char(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Pattern(word),
                });
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

/// 把单个类型模式翻译成锚定的正则表达式
fn compile_type_pattern(pattern: &str) -> Result<(Regex, bool), String> {
    let (body, include_subtypes) = match pattern.strip_suffix('+') {
        Some(body) => (body, true),
        None => (pattern, false),
    };
    if body.is_empty() || body.contains('+') {
        return Err(format!("malformed type pattern '{}'", pattern));
    }

    let mut regex = String::from("^");
    let mut rest = body;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("..") {
            if regex.len() == 1 {
                regex.push_str("(?:[^:]+::)*");
            } else {
                regex.push_str("::(?:[^:]+::)*");
            }
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("::") {
            regex.push_str("::");
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('*') {
            regex.push_str("[^:]*");
            rest = tail;
        } else {
            let c = rest.chars().next().unwrap_or_default();
            if c == ':' || c == '.' {
                return Err(format!("malformed type pattern '{}'", pattern));
            }
            regex.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
            rest = &rest[c.len_utf8()..];
        }
    }
    regex.push('$');

    Regex::new(&regex)
        .map(|regex| (regex, include_subtypes))
        .map_err(|e| e.to_string())
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn parse_or(&mut self) -> Result<TypePatternExpression, String> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.next();
            let right = self.parse_and()?;
            left = TypePatternExpression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<TypePatternExpression, String> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.next();
            let right = self.parse_unary()?;
            left = TypePatternExpression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<TypePatternExpression, String> {
        match self.next() {
            Some(Token::Not) => Ok(TypePatternExpression::Not(Box::new(self.parse_unary()?))),
            Some(Token::Open) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err("missing ')'".to_string()),
                }
            }
            Some(Token::Pattern(source)) => {
                let (regex, include_subtypes) = compile_type_pattern(&source)?;
                Ok(TypePatternExpression::Pattern {
                    source,
                    regex,
                    include_subtypes,
                })
            }
            Some(token) => Err(format!("unexpected token {:?}", token)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

/// 类型模式表达式过滤器
#[derive(Debug, Clone)]
pub struct AspectJTypeFilter {
    expression: String,
    compiled: TypePatternExpression,
}

impl AspectJTypeFilter {
    pub fn new(expression: &str) -> ContainerResult<Self> {
        let invalid = |reason: String| {
            ContainerError::Configuration(format!(
                "Invalid type pattern expression '{}': {}",
                expression, reason
            ))
        };

        let tokens = tokenize(expression).map_err(invalid)?;
        let mut parser = Parser { tokens, position: 0 };
        let compiled = parser.parse_or().map_err(invalid)?;
        if let Some(token) = parser.peek() {
            return Err(invalid(format!("unexpected token {:?}", token)));
        }

        Ok(Self {
            expression: expression.to_string(),
            compiled,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl TypeFilter for AspectJTypeFilter {
    fn matches(&self, metadata: &TypeMetadata, catalog: &TypeCatalog) -> ContainerResult<bool> {
        Ok(self.compiled.matches(metadata, catalog))
    }

    fn describe(&self) -> String {
        format!("type pattern [{}]", self.expression)
    }
}
