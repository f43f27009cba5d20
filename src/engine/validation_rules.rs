// ==========================================
// 表面处理危险品数据引擎 - 校验规则表
// ==========================================
// 职责: 声明外键关系、必填字段与纯函数格式规则
// 红线: 本文件不访问数据库
// ==========================================

/// 外键关系声明 (子表, 子列, 父表, 父列)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKeyCheck {
    pub child_table: &'static str,
    pub child_column: &'static str,
    pub parent_table: &'static str,
    pub parent_column: &'static str,
}

const fn fk(
    child_table: &'static str,
    child_column: &'static str,
    parent_table: &'static str,
    parent_column: &'static str,
) -> ForeignKeyCheck {
    ForeignKeyCheck {
        child_table,
        child_column,
        parent_table,
        parent_column,
    }
}

/// 十组外键关系；spec_dependencies 为规范依赖扩展表，未建表时跳过
pub const FK_CHECKS: [ForeignKeyCheck; 10] = [
    fk("finish_codes", "substrate_id", "substrates", "id"),
    fk("finish_codes", "finish_applied_id", "finish_applied", "id"),
    fk("finish_code_steps", "finish_code_id", "finish_codes", "id"),
    fk("finish_code_steps", "sft_id", "sft_steps", "id"),
    fk("sft_material_links", "sft_id", "sft_steps", "id"),
    fk("sft_material_links", "material_id", "materials", "id"),
    fk("material_chemicals", "material_id", "materials", "id"),
    fk("material_chemicals", "chemical_id", "chemicals", "id"),
    fk("spec_dependencies", "spec_material_id", "materials", "id"),
    fk("spec_dependencies", "ref_spec_material_id", "materials", "id"),
];

/// 必填字段 (表, 列)
pub const REQUIRED_FIELDS: [(&str, &str); 22] = [
    ("substrates", "code"),
    ("substrates", "description"),
    ("finish_applied", "code"),
    ("finish_applied", "description"),
    ("finish_codes", "code"),
    ("finish_codes", "substrate_id"),
    ("finish_codes", "finish_applied_id"),
    ("finish_codes", "seq_id"),
    ("sft_steps", "sft_code"),
    ("sft_steps", "description"),
    ("finish_code_steps", "finish_code_id"),
    ("finish_code_steps", "sft_id"),
    ("finish_code_steps", "step_order"),
    ("materials", "base_spec"),
    ("sft_material_links", "sft_id"),
    ("sft_material_links", "material_id"),
    ("chemicals", "name"),
    ("material_chemicals", "material_id"),
    ("material_chemicals", "chemical_id"),
    ("metadata_versions", "source_name"),
    ("metadata_versions", "sha256"),
    ("metadata_versions", "rows_loaded"),
];

pub const HAZARD_LEVEL_MIN: i64 = 1;
pub const HAZARD_LEVEL_MAX: i64 = 5;

/// CAS 号形状: 4-7 位数字 - 2 位数字 - 1 位数字
pub fn is_valid_cas(cas: &str) -> bool {
    let parts: Vec<&str> = cas.split('-').collect();
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    match parts.as_slice() {
        [first, second, check] => {
            all_digits(first)
                && (4..=7).contains(&first.len())
                && all_digits(second)
                && second.len() == 2
                && all_digits(check)
                && check.len() == 1
        }
        _ => false,
    }
}

/// 代码约定组成: {基材}{表面处理}{序号两位补零}
pub fn expected_finish_code(substrate_code: &str, finish_applied_code: &str, seq_id: i64) -> String {
    format!("{}{}{:02}", substrate_code, finish_applied_code, seq_id)
}

/// 检查代码组成，返回需告警时的期望代码
///
/// 仅前导零差异（如 BP1 对 BP01）不告警
pub fn composition_mismatch(
    code: &str,
    substrate_code: &str,
    finish_applied_code: &str,
    seq_id: i64,
) -> Option<String> {
    let expected = expected_finish_code(substrate_code, finish_applied_code, seq_id);
    if code == expected {
        return None;
    }

    let unpadded = format!("{}{}{}", substrate_code, finish_applied_code, seq_id);
    if code == unpadded {
        return None;
    }

    Some(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cas_shape() {
        assert!(!is_valid_cas("64-17-5"));
        assert!(is_valid_cas("7732-18-5"));
        assert!(is_valid_cas("1234567-89-0"));
        assert!(!is_valid_cas("12345678-89-0"));
        assert!(!is_valid_cas("7732-185"));
        assert!(!is_valid_cas("7732-18-5a"));
        assert!(!is_valid_cas(""));
    }

    #[test]
    fn test_composition_mismatch() {
        assert_eq!(composition_mismatch("BP01", "B", "P", 1), None);
        assert_eq!(composition_mismatch("BP1", "B", "P", 1), None);
        assert_eq!(composition_mismatch("BP12", "B", "P", 12), None);
        assert_eq!(
            composition_mismatch("XYZ", "B", "P", 1),
            Some("BP01".to_string())
        );
    }

    #[test]
    fn test_rule_tables_declared() {
        assert_eq!(FK_CHECKS.len(), 10);
        assert!(REQUIRED_FIELDS.contains(&("sft_steps", "description")));
    }
}
