// ==========================================
// 表面处理危险品数据引擎 - 规范交叉引用
// ==========================================
// 职责: 单代码规范视图 + 全局规范目录
// 红线: 逗号分隔的规范是 OR 备选，拆分后逐项保留，不拼接
// ==========================================

use crate::domain::finish::split_spec_alternatives;
use crate::domain::{FinishCodeLookup, FinishCodeSpecs, SpecCatalog, SpecUsage, StepSpecs};
use crate::engine::tree_builder::FinishTreeBuilder;
use crate::repository::error::RepositoryResult;
use crate::repository::finish_query_repo::FinishQueryRepository;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const ELLIPSIS: &str = "...";

pub struct SpecIndex {
    repo: FinishQueryRepository,
    description_max_len: usize,
}

impl SpecIndex {
    pub fn new(repo: FinishQueryRepository, description_max_len: usize) -> Self {
        Self {
            repo,
            description_max_len,
        }
    }

    /// 单个代码的步骤规范视图
    ///
    /// 未找到时复用树重建的未找到载荷
    pub fn finish_code_specs(
        &self,
        finish_code: &str,
        tree_builder: &FinishTreeBuilder,
    ) -> RepositoryResult<FinishCodeLookup<FinishCodeSpecs>> {
        let Some(header) = self.repo.find_finish_code_header(finish_code)? else {
            return Ok(FinishCodeLookup::NotFound(tree_builder.not_found(finish_code)?));
        };

        let mut specifications = BTreeSet::new();
        let mut steps_with_specs = Vec::new();

        for step in self.repo.list_steps_for_finish_code(header.id)? {
            let Some(raw) = step
                .associated_specs
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
            else {
                continue;
            };

            let alternatives = split_spec_alternatives(Some(raw));
            specifications.extend(alternatives.iter().cloned());

            steps_with_specs.push(StepSpecs {
                sft_code: step.sft_code,
                step_order: step.step_order,
                associated_specs: raw.to_string(),
                associated_specs_list: alternatives,
                description: truncate_description(&step.description, self.description_max_len),
            });
        }

        let specifications: Vec<String> = specifications.into_iter().collect();
        Ok(FinishCodeLookup::Found(FinishCodeSpecs {
            finish_code: header.code,
            spec_count: specifications.len(),
            specifications,
            steps_with_specs,
        }))
    }

    /// 全局规范目录：规范 → 引用的步骤与代码
    ///
    /// 排序: usage_count 降序，其次规范字典序
    pub fn all_specifications(&self) -> RepositoryResult<SpecCatalog> {
        let mut codes_by_step: HashMap<i64, BTreeSet<String>> = HashMap::new();
        for (sft_id, code) in self.repo.list_finish_code_step_pairs()? {
            codes_by_step.entry(sft_id).or_default().insert(code);
        }

        let mut by_spec: BTreeMap<String, (BTreeSet<String>, BTreeSet<String>)> = BTreeMap::new();
        for step in self.repo.list_steps_with_specs()? {
            for spec in split_spec_alternatives(Some(&step.associated_specs)) {
                let (sft_codes, finish_codes) = by_spec.entry(spec).or_default();
                sft_codes.insert(step.sft_code.clone());
                if let Some(codes) = codes_by_step.get(&step.sft_id) {
                    finish_codes.extend(codes.iter().cloned());
                }
            }
        }

        let mut specifications: Vec<SpecUsage> = by_spec
            .into_iter()
            .map(|(spec, (sft_codes, finish_codes))| SpecUsage {
                spec,
                usage_count: finish_codes.len(),
                sft_codes: sft_codes.into_iter().collect(),
                finish_codes: finish_codes.into_iter().collect(),
            })
            .collect();
        specifications.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.spec.cmp(&b.spec))
        });

        Ok(SpecCatalog {
            total_specs: specifications.len(),
            specifications,
        })
    }
}

/// 超长描述截断为 max_len 个字符（以 ... 结尾）
///
/// max_len 不足以容纳省略号时直接截断，不追加省略号
pub fn truncate_description(description: &str, max_len: usize) -> String {
    if description.chars().count() <= max_len {
        return description.to_string();
    }
    if max_len <= ELLIPSIS.len() {
        return description.chars().take(max_len).collect();
    }
    let keep = max_len.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = description.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
