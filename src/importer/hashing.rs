// ==========================================
// 表面处理危险品数据引擎 - 源文件摘要
// ==========================================
// 算法: SHA-256，输出小写十六进制
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use sha2::{Digest, Sha256};
use std::path::Path;

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// 计算文件内容摘要
pub fn compute_sha256(path: &Path) -> ImportResult<String> {
    let bytes = std::fs::read(path)?;
    Ok(sha256_hex(&bytes))
}

/// 校验文件内容是否与期望摘要一致
///
/// 期望摘要必须是 64 位十六进制（大小写均可）
pub fn verify_file_unchanged(path: &Path, expected: &str) -> ImportResult<bool> {
    let expected = expected.trim();
    if expected.len() != 64 || !expected.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ImportError::InvalidDigest(expected.to_string()));
    }
    let actual = compute_sha256(path)?;
    Ok(actual.eq_ignore_ascii_case(expected))
}
