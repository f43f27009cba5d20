// ==========================================
// 表面处理危险品数据引擎 - 源文件清单
// ==========================================
// 职责: 声明九类源文件的文件名、必需列与加载顺序
// 约束: 加载顺序为父表在前、子表在后
// ==========================================

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Substrate,
    FinishApplied,
    FinishCode,
    ProcessStep,
    FinishCodeStep,
    Material,
    Chemical,
    SftMaterialLink,
    MaterialChemical,
}

/// 固定加载顺序
pub const LOAD_ORDER: [SourceKind; 9] = [
    SourceKind::Substrate,
    SourceKind::FinishApplied,
    SourceKind::FinishCode,
    SourceKind::ProcessStep,
    SourceKind::FinishCodeStep,
    SourceKind::Material,
    SourceKind::Chemical,
    SourceKind::SftMaterialLink,
    SourceKind::MaterialChemical,
];

impl SourceKind {
    /// 文件名主干（不含扩展名）
    pub fn stem(&self) -> &'static str {
        match self {
            SourceKind::Substrate => "substrates",
            SourceKind::FinishApplied => "finish_applied",
            SourceKind::FinishCode => "finish_codes",
            SourceKind::ProcessStep => "sft_steps",
            SourceKind::FinishCodeStep => "finish_code_steps",
            SourceKind::Material => "materials_map",
            SourceKind::Chemical => "chemicals",
            SourceKind::SftMaterialLink => "sft_material_links",
            SourceKind::MaterialChemical => "material_chemicals",
        }
    }

    /// 报告与血缘中使用的源文件名（CSV 形式）
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.stem())
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            SourceKind::Substrate => &["code", "description"],
            SourceKind::FinishApplied => &["code", "description"],
            SourceKind::FinishCode => &[
                "finish_code",
                "substrate_code",
                "finish_applied_code",
                "seq_id",
            ],
            SourceKind::ProcessStep => &["sft_code", "description"],
            SourceKind::FinishCodeStep => &["finish_code", "sft_code", "step_order"],
            SourceKind::Material => &["base_spec"],
            SourceKind::Chemical => &["name"],
            SourceKind::SftMaterialLink => &["sft_code", "base_spec"],
            SourceKind::MaterialChemical => &["base_spec", "cas"],
        }
    }

    /// 在源目录中定位文件：CSV 优先，其次同名 .xlsx
    pub fn locate(&self, source_dir: &Path) -> Option<PathBuf> {
        ["csv", "xlsx"]
            .iter()
            .map(|ext| source_dir.join(format!("{}.{}", self.stem(), ext)))
            .find(|path| path.is_file())
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}
