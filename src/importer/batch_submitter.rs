// ==========================================
// 耐用品登记导入 - 批量提交与结果分类
// ==========================================
// 职责: 每个窗口一次 ExecuteMultiple（出错继续 + 返回响应）
// 分类:
//   - 条目故障 → 诊断行
//   - 整批故障 → 一行 "Fail to fix import data due to ..."，继续下一个窗口
//   - 超时/传输失败 → 向上传播，终止运行
// ==========================================

use crate::crm::{
    CrmError, CrmService, ExecuteMultipleRequest, ExecuteMultipleResponse, OrganizationRequest,
};
use crate::importer::error::ImportResult;
use crate::importer::warranty_importer_trait::OutcomeClassifier;
use tracing::{info, warn};

/// 提交结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 批量调用完成（可能含条目故障）
    Completed { fault_lines: Vec<String> },
    /// 整批调用故障
    BatchFault { line: String },
}

/// 条目故障诊断行（index 为 0 起的请求序号）
pub fn fault_line(request_name: &str, index: usize, message: &str) -> String {
    format!(
        "A fault occurred when processing {} request, at index {} in the request collection with a fault message: {}",
        request_name,
        index + 1,
        message
    )
}

// ==========================================
// FaultClassifier
// ==========================================
pub struct FaultClassifier;

impl FaultClassifier {
    /// 出错请求名：事务内可定位到子请求时取子请求名
    fn faulted_request_name(
        request: &OrganizationRequest,
        inner_index: Option<usize>,
    ) -> &'static str {
        match (request, inner_index) {
            (OrganizationRequest::ExecuteTransaction(tx), Some(i)) => tx
                .requests
                .get(i)
                .map(OrganizationRequest::request_name)
                .unwrap_or_else(|| request.request_name()),
            _ => request.request_name(),
        }
    }
}

impl OutcomeClassifier for FaultClassifier {
    fn classify(
        &self,
        request: &ExecuteMultipleRequest,
        response: &ExecuteMultipleResponse,
    ) -> Vec<String> {
        response
            .responses
            .iter()
            .filter_map(|item| {
                let fault = item.fault.as_ref()?;
                let name = request
                    .requests
                    .get(item.request_index)
                    .map(|r| Self::faulted_request_name(r, fault.faulted_request_index))
                    .unwrap_or("Unknown");
                Some(fault_line(name, item.request_index, &fault.message))
            })
            .collect()
    }

    fn describe_batch_fault(&self, error: &CrmError) -> String {
        format!("Fail to fix import data due to {}.", error.fault_message())
    }
}

/// 提交一个窗口的组合事务
///
/// # 返回
/// - Ok(Completed): 调用完成，附条目故障诊断行
/// - Ok(BatchFault): 远端对整批调用返回故障
/// - Err: 超时、传输失败等终止性错误
pub async fn submit_window<S: CrmService + ?Sized>(
    service: &S,
    classifier: &dyn OutcomeClassifier,
    transactions: Vec<OrganizationRequest>,
) -> ImportResult<SubmitOutcome> {
    let request = ExecuteMultipleRequest::continue_on_error(transactions);

    match service.execute_multiple(&request).await {
        Ok(response) => {
            let fault_lines = classifier.classify(&request, &response);
            info!(
                submitted = request.requests.len(),
                faulted = fault_lines.len(),
                "批量提交完成"
            );
            Ok(SubmitOutcome::Completed { fault_lines })
        }
        Err(e) if e.is_fault() => {
            warn!(error = %e, "批量提交整批故障，继续下一个窗口");
            Ok(SubmitOutcome::BatchFault {
                line: classifier.describe_batch_fault(&e),
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::{
        Entity, ExecuteMultipleResponseItem, ExecuteTransactionRequest, InMemoryCrmService,
        OrganizationServiceFault,
    };
    use async_trait::async_trait;
    use uuid::Uuid;

    fn transaction(serial: &str) -> OrganizationRequest {
        let mut tx = ExecuteTransactionRequest::default();
        tx.push(OrganizationRequest::Upsert {
            target: Entity::with_alternate_key("dsr_durable", "dsr_serialnumber", serial),
        });
        tx.push(OrganizationRequest::Create {
            target: Entity::with_id("contact", Uuid::new_v4()),
        });
        OrganizationRequest::ExecuteTransaction(tx)
    }

    #[test]
    fn test_fault_line_format() {
        assert_eq!(
            fault_line("Upsert", 0, "boom"),
            "A fault occurred when processing Upsert request, at index 1 in the request collection with a fault message: boom"
        );
    }

    #[test]
    fn test_classify_uses_inner_request_name() {
        let request =
            ExecuteMultipleRequest::continue_on_error(vec![transaction("SN1"), transaction("SN2")]);

        let mut inner = OrganizationServiceFault::new(-1, "duplicate contact");
        inner.faulted_request_index = Some(1);
        let response = ExecuteMultipleResponse {
            responses: vec![
                ExecuteMultipleResponseItem {
                    request_index: 0,
                    fault: None,
                },
                ExecuteMultipleResponseItem {
                    request_index: 1,
                    fault: Some(inner),
                },
            ],
            is_faulted: true,
        };

        let lines = FaultClassifier.classify(&request, &response);

        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("A fault occurred when processing Create request, at index 2"));
        assert!(lines[0].ends_with("duplicate contact"));
    }

    #[test]
    fn test_classify_falls_back_to_outer_name() {
        let request = ExecuteMultipleRequest::continue_on_error(vec![transaction("SN1")]);
        let response = ExecuteMultipleResponse {
            responses: vec![ExecuteMultipleResponseItem {
                request_index: 0,
                fault: Some(OrganizationServiceFault::new(-1, "whole transaction failed")),
            }],
            is_faulted: true,
        };

        let lines = FaultClassifier.classify(&request, &response);
        assert!(lines[0].contains("processing ExecuteTransaction request, at index 1"));
    }

    #[tokio::test]
    async fn test_submit_window_item_fault() {
        let service = InMemoryCrmService::new();
        service.reject_serial_number("SN2");

        let outcome = submit_window(
            &service,
            &FaultClassifier,
            vec![transaction("SN1"), transaction("SN2")],
        )
        .await
        .unwrap();

        match outcome {
            SubmitOutcome::Completed { fault_lines } => {
                assert_eq!(fault_lines.len(), 1);
                assert!(fault_lines[0].contains("Upsert request, at index 2"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(service.count("dsr_durable"), 1);
    }

    #[tokio::test]
    async fn test_submit_window_batch_fault() {
        let service = InMemoryCrmService::new();
        service.fail_next_batch("Server is busy");

        let outcome = submit_window(&service, &FaultClassifier, vec![transaction("SN1")])
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::BatchFault {
                line: "Fail to fix import data due to Server is busy.".to_string()
            }
        );
    }

    struct TimeoutService;

    #[async_trait]
    impl CrmService for TimeoutService {
        async fn who_am_i(&self) -> Result<Uuid, CrmError> {
            Ok(Uuid::nil())
        }

        async fn retrieve_multiple(
            &self,
            _query: &crate::crm::QueryExpression,
        ) -> Result<Vec<Entity>, CrmError> {
            Ok(Vec::new())
        }

        async fn execute_multiple(
            &self,
            _request: &ExecuteMultipleRequest,
        ) -> Result<ExecuteMultipleResponse, CrmError> {
            Err(CrmError::Timeout("operation timed out".to_string()))
        }
    }

    #[tokio::test]
    async fn test_submit_window_timeout_is_terminal() {
        let result =
            submit_window(&TimeoutService, &FaultClassifier, vec![transaction("SN1")]).await;

        let err = result.unwrap_err();
        assert!(err.is_timeout());
    }
}
