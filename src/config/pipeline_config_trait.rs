// ==========================================
// 表面处理危险品数据引擎 - 管道配置读取 Trait
// ==========================================
// 职责: 定义校验与查询所需的运行参数接口
// 实现者: ConfigManager（config_kv 表）、DefaultPipelineConfig（固定缺省值）
// ==========================================

use crate::repository::error::RepositoryResult;

/// 未找到代码时返回的样例数量（同时是上限，配置值只能调小）
pub const DEFAULT_NOT_FOUND_SAMPLE_LIMIT: usize = 10;
/// 规范视图中步骤描述的截断长度
pub const DEFAULT_SPEC_DESCRIPTION_MAX_LEN: usize = 80;
/// 单种材料最大重量百分比合计的告警阈值
pub const DEFAULT_WEIGHT_TOTAL_MAX_PCT: f64 = 100.0;

pub trait PipelineConfigReader: Send + Sync {
    fn get_not_found_sample_limit(&self) -> RepositoryResult<usize>;

    fn get_spec_description_max_len(&self) -> RepositoryResult<usize>;

    fn get_weight_total_max_pct(&self) -> RepositoryResult<f64>;
}

/// 固定缺省值实现（不依赖数据库）
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPipelineConfig;

impl PipelineConfigReader for DefaultPipelineConfig {
    fn get_not_found_sample_limit(&self) -> RepositoryResult<usize> {
        Ok(DEFAULT_NOT_FOUND_SAMPLE_LIMIT)
    }

    fn get_spec_description_max_len(&self) -> RepositoryResult<usize> {
        Ok(DEFAULT_SPEC_DESCRIPTION_MAX_LEN)
    }

    fn get_weight_total_max_pct(&self) -> RepositoryResult<f64> {
        Ok(DEFAULT_WEIGHT_TOTAL_MAX_PCT)
    }
}
