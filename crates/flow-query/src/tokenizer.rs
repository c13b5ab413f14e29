//! Selector tokenizer.
//!
//! Turns a selector list such as `"ul.nav > li:first-child a, #footer a"`
//! into [`SelectorGroup`]s, one per unique comma-separated alternative, each
//! holding one [`SelectorStep`] per compound selector.
//!
//! The tokenizer never fails. Fragments it cannot read are reported through
//! [`warn_once`] and dropped, so a bad fragment widens a step instead of
//! rejecting the query.

use flow_common::warning::warn_once;
use serde::Serialize;
use strum_macros::{Display, EnumString};

/// The relation between a step and the previous step's matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Combinator {
    /// Whitespace: any descendant.
    #[default]
    Descendant,
    /// `>`: element children.
    Child,
    /// `+`: the next element sibling.
    Adjacent,
    /// `~`: every following element sibling.
    General,
}

impl Combinator {
    /// The combinator spelled by a bare token, if any.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            ">" => Some(Self::Child),
            "+" => Some(Self::Adjacent),
            "~" => Some(Self::General),
            _ => None,
        }
    }

    const fn from_char(c: char) -> Option<Self> {
        match c {
            '>' => Some(Self::Child),
            '+' => Some(Self::Adjacent),
            '~' => Some(Self::General),
            _ => None,
        }
    }
}

/// String test applied by an [`AttributeFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeOperator {
    /// `=` and `|=`
    Exact,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=` and `~=`
    Substring,
}

/// One `[name]` or `[name op value]` fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeFilter {
    /// Attribute name, lowercased.
    pub name: String,
    /// `None` for a presence test.
    pub operator: Option<AttributeOperator>,
    /// Unquoted value; present whenever `operator` is.
    pub value: Option<String>,
}

/// Argument of `:nth-child()` / `:nth-of-type()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NthArgument {
    /// A bare integer: the 1-based position.
    Position(usize),
    /// A bare `n`: every position.
    Any,
    /// `step * n + offset` for n = 0, 1, 2, ...
    Formula {
        /// Coefficient of `n`
        step: i32,
        /// Constant term
        offset: i32,
    },
}

impl NthArgument {
    /// Read an nth argument. `odd` is `2n+1`, `even` is `2n+0`; anything
    /// unreadable degrades to [`NthArgument::Any`] with a warning.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let compact = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let normalized = match compact.as_str() {
            "odd" => "2n+1",
            "even" => "2n+0",
            other => other,
        };

        if normalized == "n" {
            return Self::Any;
        }
        if let Ok(position) = normalized.parse::<i64>() {
            return Self::Position(usize::try_from(position).unwrap_or(0));
        }
        if let Some((step, offset)) = normalized.split_once('n') {
            let step = match step {
                "" | "+" => Some(1),
                "-" => Some(-1),
                _ => step.parse().ok(),
            };
            let offset = if offset.is_empty() {
                Some(0)
            } else if offset.starts_with(['+', '-']) {
                offset.strip_prefix('+').unwrap_or(offset).parse().ok()
            } else {
                None
            };
            if let (Some(step), Some(offset)) = (step, offset) {
                return Self::Formula { step, offset };
            }
        }

        warn_once(
            "Selector",
            &format!("unrecognized nth argument '{raw}', matching every position"),
        );
        Self::Any
    }

    /// Whether the 1-based `position` is selected.
    #[must_use]
    pub fn matches(self, position: usize) -> bool {
        match self {
            Self::Position(k) => position == k,
            Self::Any => true,
            Self::Formula { step, offset } => {
                let Ok(position) = i64::try_from(position) else {
                    return false;
                };
                let (step, offset) = (i64::from(step), i64::from(offset));
                if step == 0 {
                    return position == offset;
                }
                let diff = position - offset;
                diff % step == 0 && diff / step >= 0
            }
        }
    }
}

/// The simplified compound inside `:not(...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Negation {
    /// Tag name or `*`.
    pub tag: String,
    /// Required id.
    pub id: Option<String>,
    /// Required classes.
    pub classes: Vec<String>,
    /// Required attributes.
    pub attributes: Vec<AttributeFilter>,
}

impl Negation {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        // `[#id]` is shorthand for `[id=id]`.
        if let Some(id) = raw.strip_prefix("[#").and_then(|r| r.strip_suffix(']')) {
            return Self {
                tag: "*".to_string(),
                id: None,
                classes: Vec::new(),
                attributes: vec![AttributeFilter {
                    name: "id".to_string(),
                    operator: Some(AttributeOperator::Exact),
                    value: Some(id.to_string()),
                }],
            };
        }

        let step = parse_step(raw, Combinator::Descendant);
        if !step.pseudos.is_empty() {
            warn_once(
                "Selector",
                &format!("pseudo-classes inside ':not({raw})' are ignored"),
            );
        }
        Self {
            tag: step.tag,
            id: step.id,
            classes: step.classes,
            attributes: step.attributes,
        }
    }
}

/// Pseudo-class names understood by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum PseudoKind {
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:only-child`
    OnlyChild,
    /// `:first-of-type`
    FirstOfType,
    /// `:last-of-type`
    LastOfType,
    /// `:only-of-type`
    OnlyOfType,
    /// `:nth-child(arg)`
    NthChild,
    /// `:nth-of-type(arg)`
    NthOfType,
    /// `:empty`
    Empty,
    /// `:contains(text)`
    Contains,
    /// `:enabled`
    Enabled,
    /// `:disabled`
    Disabled,
    /// `:checked`
    Checked,
    /// `:not(compound)`
    Not,
}

/// A parsed pseudo-class with its argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "argument", rename_all = "kebab-case")]
pub enum PseudoClass {
    /// First element child of its parent.
    FirstChild,
    /// Last element child of its parent.
    LastChild,
    /// Only element child of its parent.
    OnlyChild,
    /// First sibling with its tag.
    FirstOfType,
    /// Last sibling with its tag.
    LastOfType,
    /// Only sibling with its tag.
    OnlyOfType,
    /// Position among element siblings.
    NthChild(NthArgument),
    /// Position among same-tag siblings.
    NthOfType(NthArgument),
    /// No child nodes at all.
    Empty,
    /// Inner markup contains the text.
    Contains(String),
    /// No `disabled` attribute.
    Enabled,
    /// Has a `disabled` attribute.
    Disabled,
    /// Has a `checked` attribute.
    Checked,
    /// Does not match the compound.
    Not(Negation),
}

impl PseudoClass {
    /// The pseudo-class name.
    #[must_use]
    pub const fn kind(&self) -> PseudoKind {
        match self {
            Self::FirstChild => PseudoKind::FirstChild,
            Self::LastChild => PseudoKind::LastChild,
            Self::OnlyChild => PseudoKind::OnlyChild,
            Self::FirstOfType => PseudoKind::FirstOfType,
            Self::LastOfType => PseudoKind::LastOfType,
            Self::OnlyOfType => PseudoKind::OnlyOfType,
            Self::NthChild(_) => PseudoKind::NthChild,
            Self::NthOfType(_) => PseudoKind::NthOfType,
            Self::Empty => PseudoKind::Empty,
            Self::Contains(_) => PseudoKind::Contains,
            Self::Enabled => PseudoKind::Enabled,
            Self::Disabled => PseudoKind::Disabled,
            Self::Checked => PseudoKind::Checked,
            Self::Not(_) => PseudoKind::Not,
        }
    }

    fn parse(name: &str, argument: Option<&str>) -> Option<Self> {
        let Ok(kind) = name.to_ascii_lowercase().parse::<PseudoKind>() else {
            warn_once("Selector", &format!("unknown pseudo-class ':{name}' ignored"));
            return None;
        };
        let argument = argument.unwrap_or_default();
        Some(match kind {
            PseudoKind::FirstChild => Self::FirstChild,
            PseudoKind::LastChild => Self::LastChild,
            PseudoKind::OnlyChild => Self::OnlyChild,
            PseudoKind::FirstOfType => Self::FirstOfType,
            PseudoKind::LastOfType => Self::LastOfType,
            PseudoKind::OnlyOfType => Self::OnlyOfType,
            PseudoKind::NthChild => Self::NthChild(NthArgument::parse(argument)),
            PseudoKind::NthOfType => Self::NthOfType(NthArgument::parse(argument)),
            PseudoKind::Empty => Self::Empty,
            PseudoKind::Contains => Self::Contains(unquote(argument.trim()).to_string()),
            PseudoKind::Enabled => Self::Enabled,
            PseudoKind::Disabled => Self::Disabled,
            PseudoKind::Checked => Self::Checked,
            PseudoKind::Not => Self::Not(Negation::parse(argument)),
        })
    }
}

/// One compound selector and its relation to the previous step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorStep {
    /// Tag name (lowercased) or `*`.
    pub tag: String,
    /// `#id`
    pub id: Option<String>,
    /// `.class` fragments, all required.
    pub classes: Vec<String>,
    /// `[...]` fragments, all required.
    pub attributes: Vec<AttributeFilter>,
    /// `:pseudo` fragments, applied in order.
    pub pseudos: Vec<PseudoClass>,
    /// Relation to the previous step (or to the scope for the first step).
    pub combinator: Combinator,
}

impl SelectorStep {
    /// A step matching every element.
    #[must_use]
    pub fn wildcard(combinator: Combinator) -> Self {
        Self {
            tag: "*".to_string(),
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            pseudos: Vec::new(),
            combinator,
        }
    }
}

/// One comma-separated alternative of a selector list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorGroup {
    /// Normalized text; groups are deduplicated on this.
    pub source: String,
    /// Steps, left to right.
    pub steps: Vec<SelectorStep>,
    /// A combinator with nothing after it. Such a group matches nothing.
    pub trailing_combinator: Option<Combinator>,
}

impl SelectorGroup {
    /// Whether the group can never match.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.trailing_combinator.is_some() || self.steps.is_empty()
    }
}

/// Split a selector list into unique groups, first occurrence first.
#[must_use]
pub fn parse(selector_list: &str) -> Vec<SelectorGroup> {
    let mut groups: Vec<SelectorGroup> = Vec::new();
    for raw in split_top_level(selector_list.trim(), |c| c == ',') {
        let tokens = tokenize_group(raw);
        let source = tokens.join(" ");
        if source.is_empty() || groups.iter().any(|g| g.source == source) {
            continue;
        }
        groups.push(parse_group(source, &tokens));
    }
    groups
}

fn parse_group(source: String, tokens: &[String]) -> SelectorGroup {
    let mut steps = Vec::new();
    let mut pending: Option<Combinator> = None;
    for token in tokens {
        if let Some(combinator) = Combinator::from_token(token) {
            if pending.is_some() {
                warn_once(
                    "Selector",
                    &format!("consecutive combinators in '{source}', keeping the last"),
                );
            }
            pending = Some(combinator);
            continue;
        }
        steps.push(parse_step(token, pending.take().unwrap_or_default()));
    }
    SelectorGroup {
        source,
        steps,
        trailing_combinator: pending,
    }
}

/// Split `group` into compound tokens and bare combinator tokens. Whitespace
/// and `>`/`+`/`~` inside `[...]`, `(...)` or quotes do not split.
fn tokenize_group(group: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in group.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if depth > 0 => {
                quote = Some(c);
                current.push(c);
            }
            '[' | '(' => {
                depth += 1;
                current.push(c);
            }
            ']' | ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            _ if depth > 0 => current.push(c),
            _ if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ if Combinator::from_char(c).is_some() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Split on `separator` outside brackets, parentheses and quotes.
fn split_top_level(input: &str, separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, _) if depth == 0 && separator(c) => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Byte length of the leading name in `s`.
fn name_len(s: &str) -> usize {
    s.find(|c: char| !is_name_char(c)).unwrap_or(s.len())
}

/// Byte index of the bracket closing the one `s` starts with.
fn closing_bracket(s: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, _) if c == open => depth += 1,
            (None, _) if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip one level of matching quotes.
fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

/// Parse one compound token. Fragments may come in any order; reading
/// stops at the first character that starts none of them.
fn parse_step(token: &str, combinator: Combinator) -> SelectorStep {
    let mut step = SelectorStep::wildcard(combinator);
    let tag_len = name_len(token);
    if tag_len > 0 {
        step.tag = token[..tag_len].to_ascii_lowercase();
    }
    let mut rest = &token[tag_len..];

    while let Some(c) = rest.chars().next() {
        let consumed = match c {
            '*' => {
                step.tag = "*".to_string();
                Some(1)
            }
            '#' | '.' => {
                let len = name_len(&rest[1..]);
                (len > 0).then(|| {
                    let name = rest[1..=len].to_string();
                    if c == '#' {
                        step.id = Some(name);
                    } else {
                        step.classes.push(name);
                    }
                    len + 1
                })
            }
            '[' => closing_bracket(rest, '[', ']').map(|end| {
                if let Some(filter) = parse_attribute(&rest[1..end]) {
                    step.attributes.push(filter);
                }
                end + 1
            }),
            ':' => {
                let len = name_len(&rest[1..]);
                let name = &rest[1..=len];
                let after = &rest[len + 1..];
                if len == 0 {
                    None
                } else if after.starts_with('(') {
                    closing_bracket(after, '(', ')').map(|end| {
                        step.pseudos.extend(PseudoClass::parse(name, Some(&after[1..end])));
                        len + 1 + end + 1
                    })
                } else {
                    step.pseudos.extend(PseudoClass::parse(name, None));
                    Some(len + 1)
                }
            }
            _ => None,
        };

        let Some(consumed) = consumed else {
            warn_once(
                "Selector",
                &format!("ignoring unreadable selector text '{rest}' in '{token}'"),
            );
            break;
        };
        rest = &rest[consumed..];
    }
    step
}

fn parse_attribute(inner: &str) -> Option<AttributeFilter> {
    let Some(eq) = inner.find('=') else {
        let name = inner.trim();
        return (!name.is_empty()).then(|| AttributeFilter {
            name: name.to_ascii_lowercase(),
            operator: None,
            value: None,
        });
    };

    let (mut name, value) = (inner[..eq].trim(), inner[eq + 1..].trim());
    let mut operator = AttributeOperator::Exact;
    if let Some(last) = name.chars().last() {
        let found = match last {
            '^' => Some(AttributeOperator::Prefix),
            '$' => Some(AttributeOperator::Suffix),
            '*' | '~' => Some(AttributeOperator::Substring),
            '|' => Some(AttributeOperator::Exact),
            _ => None,
        };
        if let Some(found) = found {
            operator = found;
            name = name[..name.len() - 1].trim_end();
        }
    }

    if name.is_empty() {
        warn_once("Selector", &format!("attribute selector '[{inner}]' has no name"));
        return None;
    }
    Some(AttributeFilter {
        name: name.to_ascii_lowercase(),
        operator: Some(operator),
        value: Some(unquote(value).to_string()),
    })
}
