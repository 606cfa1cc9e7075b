//! Extraction debug endpoint.
//!
//! - POST /api/test-extraction - Run the extraction cascade on arbitrary text

use axum::Json;

use agentline_core::agent::test_extraction;
use agentline_types::conversation::{ExtractionTestRequest, ExtractionTestResponse};

/// POST /api/test-extraction - No auth; touches neither store nor model.
pub async fn test_extraction_endpoint(
    Json(request): Json<ExtractionTestRequest>,
) -> Json<ExtractionTestResponse> {
    Json(test_extraction(request.text))
}
