use std::{iter::Peekable, str::CharIndices, str::FromStr};

use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;

use crate::{
    math::fraction::Fraction,
    objects::{
        linear_relation::LinearRelation,
        variable::{NumericKind, Variable},
    },
};

/**
 * The variables declared so far, by name.
 */
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    variables: IndexMap<String, Variable>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declaring a name twice is allowed only with the same kind.
    pub fn declare(&mut self, variable: Variable) -> Result<()> {
        if let Some(existing) = self.variables.get(variable.name()) {
            if existing.kind() != variable.kind() {
                return Err(anyhow!(
                    "variable `{}` was declared as {} before, not as {}",
                    variable,
                    existing.kind(),
                    variable.kind()
                ));
            }
            return Ok(());
        }
        self.variables.insert(variable.name().to_string(), variable);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/**
 * Parses a declaration `<kind> name[, name…]`. Returns None if the line does not start with a kind.
 */
pub fn parse_declaration(line: &str) -> Result<Option<Vec<Variable>>> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some(split) => split,
        None => return Ok(None),
    };
    let kind = match NumericKind::from_str(head) {
        Ok(kind) => kind,
        Err(_) => return Ok(None),
    };

    let mut result = vec![];
    for name in rest.split(',') {
        let name = name.trim();
        if !is_identifier(name) {
            return Err(anyhow!("`{}` is not a valid variable name", name));
        }
        result.push(Variable::new(name, kind));
    }
    Ok(Some(result))
}

/**
 * Parses a relation `expr OP expr` with OP one of `=`, `<=`, `<`, `>=`, `>`, over declared variables. The
 * result is normalised to `lhs - rhs ⋈ 0` with ⋈ one of `=`, `≤`, `<`.
 */
pub fn parse_relation(line: &str, declarations: &Declarations) -> Result<LinearRelation> {
    let (lhs, operator, rhs) = split_operator(line)?;

    let (relation, flip) = match operator {
        "=" => (LinearRelation::equation(), false),
        "<=" => (LinearRelation::weak(), false),
        "<" => (LinearRelation::strict(), false),
        ">=" => (LinearRelation::weak(), true),
        ">" => (LinearRelation::strict(), true),
        _ => unreachable!(),
    };

    let mut relation = relation;
    add_expression(&mut relation, lhs, declarations, false)
        .with_context(|| format!("could not parse left-hand side `{}`", lhs.trim()))?;
    add_expression(&mut relation, rhs, declarations, true)
        .with_context(|| format!("could not parse right-hand side `{}`", rhs.trim()))?;

    if flip {
        Ok(relation.negate_polynomial())
    } else {
        Ok(relation)
    }
}

fn split_operator(line: &str) -> Result<(&str, &'static str, &str)> {
    let mut found: Option<(usize, &'static str)> = None;
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let operator = match bytes[i] {
            b'<' if bytes.get(i + 1) == Some(&b'=') => "<=",
            b'>' if bytes.get(i + 1) == Some(&b'=') => ">=",
            b'<' => "<",
            b'>' => ">",
            b'=' => "=",
            _ => {
                i += 1;
                continue;
            }
        };
        if found.is_some() {
            return Err(anyhow!("`{}` contains more than one relational operator", line));
        }
        found = Some((i, operator));
        i += operator.len();
    }

    match found {
        Some((position, operator)) => Ok((
            &line[..position],
            operator,
            &line[position + operator.len()..],
        )),
        None => Err(anyhow!("`{}` contains no relational operator", line)),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Number(&'a str),
    Identifier(&'a str),
    Plus,
    Minus,
    Times,
}

fn tokenise(expression: &str) -> Result<Vec<Token<'_>>> {
    let mut result = vec![];
    let mut chars: Peekable<CharIndices> = expression.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            _ if c.is_whitespace() => {}
            '+' => result.push(Token::Plus),
            '-' => result.push(Token::Minus),
            '*' => result.push(Token::Times),
            _ if c.is_ascii_digit() || c == '.' => {
                let mut end = start + c.len_utf8();
                while let Some((index, next)) = chars.peek().copied() {
                    if next.is_ascii_digit() || next == '.' || next == '/' {
                        end = index + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                result.push(Token::Number(&expression[start..end]));
            }
            _ if c.is_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some((index, next)) = chars.peek().copied() {
                    if next.is_alphanumeric() || next == '_' {
                        end = index + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                result.push(Token::Identifier(&expression[start..end]));
            }
            _ => return Err(anyhow!("unexpected character `{}`", c)),
        }
    }
    Ok(result)
}

/**
 * Adds the expression, or its negation, to the polynomial of the relation.
 */
fn add_expression(
    relation: &mut LinearRelation,
    expression: &str,
    declarations: &Declarations,
    negate: bool,
) -> Result<()> {
    let tokens = tokenise(expression)?;
    if tokens.is_empty() {
        return Err(anyhow!("empty expression"));
    }

    let mut tokens = tokens.into_iter().peekable();
    let mut first = true;
    while tokens.peek().is_some() {
        // sign
        let mut negative = negate;
        let mut signs = 0;
        while let Some(token) = tokens.peek() {
            match token {
                Token::Plus => {}
                Token::Minus => negative = !negative,
                _ => break,
            }
            signs += 1;
            tokens.next();
        }
        if signs == 0 && !first {
            return Err(anyhow!("expected `+` or `-` between terms"));
        }
        first = false;

        // coefficient
        let mut coefficient = None;
        if let Some(Token::Number(text)) = tokens.peek() {
            let value = Fraction::from_str(text)
                .with_context(|| format!("`{}` is not a number", text))?;
            coefficient = Some(value);
            tokens.next();
            if tokens.peek() == Some(&Token::Times) {
                tokens.next();
                if !matches!(tokens.peek(), Some(Token::Identifier(_))) {
                    return Err(anyhow!("expected a variable after `*`"));
                }
            }
        }

        // variable
        let variable = if let Some(Token::Identifier(name)) = tokens.peek() {
            let variable = declarations
                .get(name)
                .ok_or_else(|| anyhow!("variable `{}` is not declared", name))?
                .clone();
            tokens.next();
            Some(variable)
        } else {
            None
        };

        let mut value = match (coefficient, &variable) {
            (Some(value), _) => value,
            (None, Some(_)) => Fraction::from(1),
            (None, None) => match tokens.peek() {
                Some(token) => return Err(anyhow!("unexpected {:?}", token)),
                None => return Err(anyhow!("expression ends with a sign")),
            },
        };
        if negative {
            value = -value;
        }

        match variable {
            Some(variable) => relation.add_term(variable, value),
            None => relation.add_constant(&value),
        }
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        math::fraction::Fraction,
        objects::{
            linear_relation::RelationKind,
            relation_parser::{Declarations, parse_declaration, parse_relation},
            variable::{NumericKind, Variable},
        },
    };

    fn declarations() -> Declarations {
        let mut result = Declarations::new();
        for line in ["int x, y", "double z", "real w"] {
            for variable in parse_declaration(line).unwrap().unwrap() {
                result.declare(variable).unwrap();
            }
        }
        result
    }

    #[test]
    fn declarations_parse() {
        let variables = parse_declaration("int x,  y").unwrap().unwrap();
        assert_eq!(
            variables,
            vec![
                Variable::new("x", NumericKind::Int),
                Variable::new("y", NumericKind::Int)
            ]
        );
        assert!(parse_declaration("x <= 3").unwrap().is_none());
        assert!(parse_declaration("pop").unwrap().is_none());
        assert!(parse_declaration("int 3x").is_err());

        let mut declared = declarations();
        assert_eq!(declared.len(), 4);
        declared.declare(Variable::new("x", NumericKind::Int)).unwrap();
        assert!(declared.declare(Variable::new("x", NumericKind::Long)).is_err());
    }

    #[test]
    fn terms() {
        let declared = declarations();
        let relation = parse_relation("2x + 3/2*y - z + 0.5 w <= 4", &declared).unwrap();
        assert_eq!(relation.kind(), RelationKind::WeakInequality);
        let x = declared.get("x").unwrap();
        let y = declared.get("y").unwrap();
        let z = declared.get("z").unwrap();
        let w = declared.get("w").unwrap();
        assert_eq!(relation.coefficient(x), Some(&Fraction::from(2)));
        assert_eq!(relation.coefficient(y), Some(&Fraction::from((3, 2))));
        assert_eq!(relation.coefficient(z), Some(&Fraction::from(-1)));
        assert_eq!(relation.coefficient(w), Some(&Fraction::from((1, 2))));
        assert_eq!(relation.constant(), &Fraction::from(-4));
    }

    #[test]
    fn operators_normalise() {
        let declared = declarations();
        let x = declared.get("x").unwrap();
        let y = declared.get("y").unwrap();

        // x >= y + 1  becomes  -x + y + 1 <= 0
        let relation = parse_relation("x >= y + 1", &declared).unwrap();
        assert_eq!(relation.kind(), RelationKind::WeakInequality);
        assert_eq!(relation.coefficient(x), Some(&Fraction::from(-1)));
        assert_eq!(relation.coefficient(y), Some(&Fraction::from(1)));
        assert_eq!(relation.constant(), &Fraction::from(1));

        let relation = parse_relation("3 > x", &declared).unwrap();
        assert_eq!(relation.kind(), RelationKind::StrictInequality);
        assert_eq!(relation.coefficient(x), Some(&Fraction::from(1)));
        assert_eq!(relation.constant(), &Fraction::from(-3));

        let relation = parse_relation("x = x", &declared).unwrap();
        assert!(relation.is_constant());
        assert_eq!(relation.kind(), RelationKind::Equation);

        let relation = parse_relation("-x < --2", &declared).unwrap();
        assert_eq!(relation.kind(), RelationKind::StrictInequality);
        assert_eq!(relation.coefficient(x), Some(&Fraction::from(-1)));
        assert_eq!(relation.constant(), &Fraction::from(-2));
    }

    #[test]
    fn malformed() {
        let declared = declarations();
        assert!(parse_relation("x + y", &declared).is_err());
        assert!(parse_relation("x <= y <= 3", &declared).is_err());
        assert!(parse_relation("x <= q", &declared).is_err());
        assert!(parse_relation("x y <= 3", &declared).is_err());
        assert!(parse_relation("x + <= 3", &declared).is_err());
        assert!(parse_relation("2* <= 3", &declared).is_err());
        assert!(parse_relation("x <= ", &declared).is_err());
        assert!(parse_relation("x <= 3 % 2", &declared).is_err());
    }
}
