//! HTTP endpoint the target runner calls back into.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use hn_engine::{Instance, Solution};
use hn_types::{CallbackError, HnError};

use crate::decoder::ExecuteRequest;
use crate::orchestrator::Orchestrator;

pub fn router<I: Instance, S: Solution>(orchestrator: Arc<Orchestrator<I, S>>) -> Router {
    Router::new()
        .route("/execute", post(execute::<I, S>))
        .route("/health", get(health))
        .with_state(orchestrator)
}

async fn execute<I: Instance, S: Solution>(
    State(orchestrator): State<Arc<Orchestrator<I, S>>>,
    Json(request): Json<ExecuteRequest>,
) -> Response {
    match orchestrator.handle(request).await {
        Ok(outcome) => (StatusCode::OK, outcome.to_wire()).into_response(),
        Err(HnError::Callback(CallbackError::AuthError)) => {
            (StatusCode::FORBIDDEN, "invalid integration key").into_response()
        }
        Err(HnError::Callback(e)) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use hn_engine::{Algorithm, AlgorithmGenerator, ExecutionContext, InstanceLoader};
    use hn_types::{AlgorithmConfiguration, AutoconfigConfig, HnResult, IllegalAlgorithmConfig};
    use tower::ServiceExt;

    use crate::secret::IntegrationSecret;

    struct Unit;

    impl Instance for Unit {
        fn id(&self) -> &str {
            "unit"
        }
    }

    struct Zero;

    impl Solution for Zero {
        fn objective(&self) -> f64 {
            0.0
        }
    }

    #[derive(Debug)]
    struct Noop;

    impl Algorithm<Unit, Zero> for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        fn run(&self, _instance: &Unit, _ctx: &mut ExecutionContext) -> Zero {
            Zero
        }
    }

    struct NoopGenerator;

    impl AlgorithmGenerator<Unit, Zero> for NoopGenerator {
        fn build(
            &self,
            config: &AlgorithmConfiguration,
        ) -> Result<Box<dyn Algorithm<Unit, Zero>>, IllegalAlgorithmConfig> {
            if config.contains("broken") {
                return Err(IllegalAlgorithmConfig::new("broken"));
            }
            Ok(Box::new(Noop))
        }
    }

    struct UnitLoader;

    impl InstanceLoader<Unit> for UnitLoader {
        fn load(&self, _path: &str) -> HnResult<Unit> {
            Ok(Unit)
        }
    }

    fn app() -> Router {
        let orchestrator = Orchestrator::<Unit, Zero>::builder(AutoconfigConfig::default())
            .generator(NoopGenerator)
            .instance_loader(UnitLoader)
            .secret(IntegrationSecret::from_value("key"))
            .build()
            .unwrap();
        router(orchestrator)
    }

    async fn post_execute(app: Router, request: &ExecuteRequest) -> (StatusCode, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/execute")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(request).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_check() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn execute_returns_score_and_time() {
        let request = ExecuteRequest::encode("key", "c1 i1 5 inst");
        let (status, body) = post_execute(app(), &request).await;
        assert_eq!(status, StatusCode::OK);
        let fields: Vec<&str> = body.split(' ').collect();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], "0.0");
        assert!(fields[1].parse::<f64>().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn rejected_candidate_gets_sentinel() {
        let request = ExecuteRequest::encode("key", "c1 i1 5 inst broken=1");
        let (status, body) = post_execute(app(), &request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Inf 0");
    }

    #[tokio::test]
    async fn error_statuses() {
        let (status, _) = post_execute(app(), &ExecuteRequest::encode("nope", "c i 1 p")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = post_execute(app(), &ExecuteRequest::encode("key", "c i 1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
