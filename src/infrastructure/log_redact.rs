//! 日志脱敏
//!
//! 用户 id 和地址只以截断形式进入日志；助记词、passphrase、种子、私钥从不记录。

/// 脱敏地址（显示前6位和后4位）
pub fn redact_address(address: &str) -> String {
    redact(address, 6, 4)
}

/// 脱敏用户 id（显示前4位）
pub fn redact_id(id: &str) -> String {
    redact(id, 4, 0)
}

fn redact(value: &str, prefix: usize, suffix: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= prefix + suffix + 2 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..prefix].iter().collect();
    let tail: String = chars[chars.len() - suffix..].iter().collect();
    format!("{}...{}", head, tail)
}
