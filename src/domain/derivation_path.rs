//! BIP32/BIP44 派生路径解析
//!
//! 支持：
//! - `m/44'/60'/0'/0/0`，前导 `m` 可省略
//! - 硬化标记 `'`、`h`、`H`
//! - 批量模板：恰好一个占位符（`%d` 或 `{index}`），展开为 `[start, start+count)`

use std::fmt;
use std::str::FromStr;

use crate::error::{WalletError, WalletResult};

/// 硬化偏移 2^31
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

const PLACEHOLDERS: [&str; 2] = ["%d", "{index}"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    /// 31 位索引（不含硬化偏移）
    pub index: u32,
    pub hardened: bool,
}

impl Segment {
    pub fn normal(index: u32) -> WalletResult<Self> {
        Self::checked(index, false)
    }

    pub fn hardened(index: u32) -> WalletResult<Self> {
        Self::checked(index, true)
    }

    fn checked(index: u32, hardened: bool) -> WalletResult<Self> {
        if index >= HARDENED_OFFSET {
            return Err(WalletError::validation(format!(
                "path index {} out of range (must be < 2^31)",
                index
            )));
        }
        Ok(Self { index, hardened })
    }

    /// 序列化到 CKD 的 32 位索引
    pub fn child_number(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DerivationPath {
    segments: Vec<Segment>,
}

impl DerivationPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// 解析路径字符串
    pub fn parse(path: &str) -> WalletResult<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(WalletError::validation("derivation path is empty"));
        }

        let mut components = trimmed.split('/').peekable();
        if components.peek() == Some(&"m") || components.peek() == Some(&"M") {
            components.next();
        }

        let segments = components
            .map(|component| parse_component(component, path))
            .collect::<WalletResult<Vec<_>>>()?;

        if segments.is_empty() {
            return Err(WalletError::validation(format!(
                "derivation path '{}' has no components",
                path
            )));
        }

        Ok(Self { segments })
    }

    /// 与另一路径的公共前缀长度
    pub fn common_prefix_len(&self, other: &DerivationPath) -> usize {
        self.segments
            .iter()
            .zip(other.segments.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }
}

fn parse_component(component: &str, path: &str) -> WalletResult<Segment> {
    let (digits, hardened) = match component
        .strip_suffix('\'')
        .or_else(|| component.strip_suffix('h'))
        .or_else(|| component.strip_suffix('H'))
    {
        Some(rest) => (rest, true),
        None => (component, false),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WalletError::validation(format!(
            "malformed component '{}' in derivation path '{}'",
            component, path
        )));
    }

    let index: u32 = digits.parse().map_err(|_| {
        WalletError::validation(format!(
            "path index '{}' out of range in derivation path '{}'",
            digits, path
        ))
    })?;

    Segment::checked(index, hardened)
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// 展开批量模板
///
/// 全部成功或整体失败：任何一个索引展开后不合法都会让整个批次返回错误。
pub fn expand_template(
    template: &str,
    start_index: u32,
    count: u32,
    max_count: u32,
) -> WalletResult<Vec<DerivationPath>> {
    if count == 0 {
        return Err(WalletError::validation("count must be at least 1"));
    }
    if count > max_count {
        return Err(WalletError::validation(format!(
            "count {} exceeds the maximum batch size {}",
            count, max_count
        )));
    }

    let placeholder = find_placeholder(template)?;

    let end = start_index.checked_add(count).ok_or_else(|| {
        WalletError::validation(format!(
            "index range {}+{} overflows",
            start_index, count
        ))
    })?;

    (start_index..end)
        .map(|index| DerivationPath::parse(&template.replacen(placeholder, &index.to_string(), 1)))
        .collect()
}

fn find_placeholder(template: &str) -> WalletResult<&'static str> {
    let mut found = None;
    let mut occurrences = 0;
    for placeholder in PLACEHOLDERS {
        let n = template.matches(placeholder).count();
        if n > 0 {
            found = Some(placeholder);
            occurrences += n;
        }
    }

    match (found, occurrences) {
        (Some(placeholder), 1) => Ok(placeholder),
        (None, _) => Err(WalletError::validation(format!(
            "path template '{}' has no index placeholder",
            template
        ))),
        _ => Err(WalletError::validation(format!(
            "path template '{}' must contain exactly one index placeholder",
            template
        ))),
    }
}
