//! 子账户管理命令
//!
//! 上游提取的 action 字符串在边界处一次性解码为封闭的命令枚举。

use serde::Serialize;

use crate::{
    domain::{
        category::normalize_category,
        request_context::{non_blank, ExtractedFields, ResolutionCache},
        subaccount_registry::{Subaccount, SubaccountRegistry},
    },
    error::{Result, SubaccountError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubaccountCommand {
    List,
    Create { category: String },
    SetGoal { category: String, goal: String },
}

impl SubaccountCommand {
    pub fn decode(fields: &ExtractedFields) -> Result<Self> {
        let action = non_blank(fields.action.as_deref())
            .ok_or_else(|| SubaccountError::MissingField("action".into()))?;

        match action.to_lowercase().as_str() {
            "list" => Ok(SubaccountCommand::List),
            "create" => Ok(SubaccountCommand::Create {
                category: required_category(fields)?,
            }),
            "set_goal" | "setgoal" => {
                let category = required_category(fields)?;
                let goal = non_blank(fields.goal.as_deref())
                    .ok_or_else(|| SubaccountError::MissingField("goal".into()))?;
                Ok(SubaccountCommand::SetGoal {
                    category,
                    goal: goal.to_string(),
                })
            }
            _ => Err(SubaccountError::UnsupportedAction(action.to_string())),
        }
    }

    /// 执行命令；SetGoal 只写入请求级缓存
    pub fn execute(
        self,
        registry: &SubaccountRegistry,
        cache: &mut ResolutionCache,
    ) -> Result<SubaccountOutcome> {
        match self {
            SubaccountCommand::List => Ok(SubaccountOutcome::Listed {
                subaccounts: registry.list_subaccounts(),
            }),
            SubaccountCommand::Create { category } => Ok(SubaccountOutcome::Created {
                subaccount: registry.create_subaccount_entry(&category)?,
            }),
            SubaccountCommand::SetGoal { category, goal } => {
                tracing::info!(category = %category, goal = %goal, "Savings goal set");
                cache.goals.insert(category.clone(), goal.clone());
                Ok(SubaccountOutcome::GoalSet { category, goal })
            }
        }
    }
}

fn required_category(fields: &ExtractedFields) -> Result<String> {
    non_blank(fields.category.as_deref())
        .map(normalize_category)
        .ok_or_else(|| SubaccountError::MissingField("category".into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubaccountOutcome {
    Listed { subaccounts: Vec<Subaccount> },
    Created { subaccount: Subaccount },
    GoalSet { category: String, goal: String },
}

impl SubaccountOutcome {
    /// 对话层展示文本
    pub fn message(&self) -> String {
        match self {
            SubaccountOutcome::Listed { subaccounts } => {
                let lines: Vec<String> = subaccounts
                    .iter()
                    .map(|s| format!("- {} (#{}): {}", s.category, s.index, s.address))
                    .collect();
                format!("Subaccounts:\n{}", lines.join("\n"))
            }
            SubaccountOutcome::Created { subaccount } => format!(
                "Subaccount '{}' is at {}",
                subaccount.category, subaccount.address
            ),
            SubaccountOutcome::GoalSet { category, goal } => {
                format!("Goal for '{}' set to {}", category, goal)
            }
        }
    }
}

/// 子账户 provider 文本：`<agent>'s Subaccounts:\n<JSON>`
///
/// 别名映射构建时会从这段文本中解析回 JSON。
pub fn render_subaccount_provider(
    agent_name: Option<&str>,
    registry: &SubaccountRegistry,
) -> Result<String> {
    let agent = non_blank(agent_name).unwrap_or("The agent");
    let json = serde_json::to_string_pretty(&registry.get_all_subaccounts())
        .map_err(|e| SubaccountError::Derivation(format!("failed to render subaccounts: {}", e)))?;
    Ok(format!("{}'s Subaccounts:\n{}", agent, json))
}
