// ==========================================
// 表面处理危险品数据引擎 - 层级树重建
// ==========================================
// 职责: 将规范化存储还原为 finish_code → steps → materials → chemicals → provenance
// 红线: 直接规范 / 表面处理规范 / 步骤规范三层分开输出
// 红线: 未找到时返回结构化载荷，不报错
// ==========================================

use crate::config::pipeline_config_trait::DEFAULT_NOT_FOUND_SAMPLE_LIMIT;
use crate::domain::finish::split_spec_alternatives;
use crate::domain::tree::parse_hazard_flags;
use crate::domain::{
    ChemicalHazardEntry, ChemicalNode, CodeDescription, FinishCodeLookup, FinishCodeNotFound,
    FinishCodeSummary, FinishCodeTree, MaterialNode, ParsedFinishCode, Provenance, StepNode,
};
use crate::repository::error::RepositoryResult;
use crate::repository::finish_query_repo::{FinishCodeHeader, FinishQueryRepository, StepRow};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

pub const NOT_FOUND_MESSAGE: &str = "Finish code not found";

pub struct FinishTreeBuilder {
    repo: FinishQueryRepository,
    not_found_sample_limit: usize,
}

impl FinishTreeBuilder {
    /// 样例数量不超过 DEFAULT_NOT_FOUND_SAMPLE_LIMIT
    pub fn new(repo: FinishQueryRepository, not_found_sample_limit: usize) -> Self {
        Self {
            repo,
            not_found_sample_limit: not_found_sample_limit.min(DEFAULT_NOT_FOUND_SAMPLE_LIMIT),
        }
    }

    /// 未找到载荷：请求代码 + 字典序样例代码
    pub fn not_found(&self, finish_code: &str) -> RepositoryResult<FinishCodeNotFound> {
        Ok(FinishCodeNotFound {
            error: NOT_FOUND_MESSAGE.to_string(),
            finish_code: finish_code.to_string(),
            available_codes: self.repo.list_sample_codes(self.not_found_sample_limit)?,
        })
    }

    /// 重建单个代码的完整层级
    #[instrument(skip(self))]
    pub fn build_tree(&self, finish_code: &str) -> RepositoryResult<FinishCodeLookup<FinishCodeTree>> {
        let Some(header) = self.repo.find_finish_code_header(finish_code)? else {
            debug!(finish_code, "表面处理代码不存在");
            return Ok(FinishCodeLookup::NotFound(self.not_found(finish_code)?));
        };

        let steps = self
            .repo
            .list_steps_for_finish_code(header.id)?
            .into_iter()
            .map(|step| self.build_step(step))
            .collect::<RepositoryResult<Vec<_>>>()?;

        let direct_specs = split_spec_alternatives(header.associated_specs.as_deref());
        let finish_applied_specs = split_spec_alternatives(header.finish_applied_specs.as_deref());

        Ok(FinishCodeLookup::Found(FinishCodeTree {
            finish_code: header.code.clone(),
            parsed: parsed_identity(header),
            direct_specs,
            finish_applied_specs,
            steps,
            provenance: self.provenance()?,
        }))
    }

    fn build_step(&self, step: StepRow) -> RepositoryResult<StepNode> {
        let materials = self
            .repo
            .list_materials_for_step(step.sft_id)?
            .into_iter()
            .map(|material| {
                let chemicals = self
                    .repo
                    .list_chemicals_for_material(material.material_id)?
                    .into_iter()
                    .map(|c| ChemicalNode {
                        hazard_flags: parse_hazard_flags(c.hazard_flags.as_deref()),
                        name: c.name,
                        cas: c.cas,
                        pct_wt_low: c.pct_wt_low,
                        pct_wt_high: c.pct_wt_high,
                        default_hazard_level: c.default_hazard_level,
                        composition_notes: c.notes,
                    })
                    .collect();

                Ok(MaterialNode {
                    base_spec: material.base_spec,
                    variant: material.variant,
                    description: material.description,
                    notes: material.notes,
                    link_note: material.link_note,
                    chemicals,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(StepNode {
            associated_specs_list: split_spec_alternatives(step.associated_specs.as_deref()),
            sft_code: step.sft_code,
            step_order: step.step_order,
            parent_group: step.parent_group,
            description: step.description,
            associated_specs: step.associated_specs,
            source_doc: step.source_doc,
            last_review: step.last_review,
            notes: step.notes,
            materials,
        })
    }

    /// 源文件摘要映射 + 最近一次导入时间
    fn provenance(&self) -> RepositoryResult<Provenance> {
        let lineage = self.repo.list_lineage()?;
        let loaded_at = lineage.iter().map(|m| m.loaded_at.clone()).max();
        let source_digests: BTreeMap<String, String> = lineage
            .into_iter()
            .map(|m| (m.source_name, m.sha256))
            .collect();

        Ok(Provenance {
            source_digests,
            loaded_at,
        })
    }

    /// 全部代码清单（按代码字典序）
    pub fn list_codes(&self) -> RepositoryResult<Vec<FinishCodeSummary>> {
        self.repo.list_finish_code_summaries()
    }

    /// 危险等级不低于 min_level 的化学品（范围校验由调用方负责）
    pub fn chemicals_by_hazard_level(&self, min_level: i64) -> RepositoryResult<Vec<ChemicalHazardEntry>> {
        Ok(self
            .repo
            .list_chemicals_min_hazard(min_level)?
            .into_iter()
            .map(|c| ChemicalHazardEntry {
                hazard_flags: parse_hazard_flags(c.hazard_flags.as_deref()),
                name: c.name,
                cas: c.cas,
                default_hazard_level: c.default_hazard_level,
            })
            .collect())
    }
}

fn parsed_identity(header: FinishCodeHeader) -> ParsedFinishCode {
    ParsedFinishCode {
        substrate: CodeDescription {
            code: header.substrate_code,
            description: header.substrate_description,
        },
        finish_applied: CodeDescription {
            code: header.finish_applied_code,
            description: header.finish_applied_description,
        },
        seq_id: header.seq_id,
        finish_description: header.description,
        notes: header.notes,
        source_doc: header.source_doc,
        program: header.program,
        associated_specs: header.associated_specs,
    }
}
