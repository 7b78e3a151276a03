//! Spreadsheet endpoints (`/sheets/v3`)
//!
//! Range strings such as `Sheet1!A1:C3` are passed through into the path
//! untouched; spreadsheet tokens are percent-encoded.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::LarkClient;
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::request::ApiRequest;

/// Spreadsheet metadata from `/metainfo`.
#[derive(Debug, Clone, Deserialize)]
pub struct Spreadsheet {
    #[serde(default)]
    pub sheet_token: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

/// One worksheet inside a spreadsheet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetInfo {
    pub sheet_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub index: i64,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

/// Cell formatting for `set_cell_style`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<String>,
}

/// RGB channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
}

impl Color {
    pub fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dimension {
    Row,
    Column,
}

#[derive(Debug, Deserialize)]
struct RangeValues {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SheetList {
    #[serde(default)]
    sheets: Vec<SheetInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct BatchUpdateReply {
    #[serde(default)]
    replies: Vec<Value>,
}

/// Spreadsheet endpoints, obtained from `LarkClient::sheets()`.
pub struct SheetService<'a> {
    client: &'a LarkClient,
}

impl<'a> SheetService<'a> {
    pub(crate) fn new(client: &'a LarkClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, token: &str) -> Result<Spreadsheet> {
        let request = ApiRequest::get(format!("{}/metainfo", spreadsheet_path(token)));
        self.client.call(request).await
    }

    /// Cell values in `range`, row by row.
    pub async fn read_range(&self, token: &str, range: &str) -> Result<Vec<Vec<Value>>> {
        let request = ApiRequest::get(values_path(token, range, ""));
        let data: RangeValues = self.client.call(request).await?;
        Ok(data.values)
    }

    /// Overwrite `range` with `values`.
    pub async fn write_range(&self, token: &str, range: &str, values: &[Vec<Value>]) -> Result<()> {
        let request =
            ApiRequest::put(values_path(token, range, "")).json(&json!({ "values": values }))?;
        self.client.call_empty(request).await
    }

    /// Append rows after the last non-empty row of `range`.
    pub async fn append_range(
        &self,
        token: &str,
        range: &str,
        values: &[Vec<Value>],
    ) -> Result<()> {
        let request = ApiRequest::post(values_path(token, range, ":append"))
            .json(&json!({ "values": values }))?;
        self.client.call_empty(request).await
    }

    pub async fn clear_range(&self, token: &str, range: &str) -> Result<()> {
        let request = ApiRequest::post(values_path(token, range, ":clear"));
        self.client.call_empty(request).await
    }

    pub async fn get_sheets(&self, token: &str) -> Result<Vec<SheetInfo>> {
        let request = ApiRequest::get(format!("{}/sheets/query", spreadsheet_path(token)));
        let data: SheetList = self.client.call(request).await?;
        Ok(data.sheets)
    }

    /// Add a worksheet titled `title` and return its sheet id.
    pub async fn add_sheet(&self, token: &str, title: &str) -> Result<String> {
        let reply = self
            .batch_update(
                token,
                json!({ "addSheet": { "properties": { "title": title } } }),
            )
            .await?;

        let sheet_id = reply
            .replies
            .first()
            .and_then(|r| r.pointer("/addSheet/properties/sheetId"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::Decode("add sheet response has no sheetId".into()))?;
        debug!(token, sheet_id, title, "sheet added");
        Ok(sheet_id.to_string())
    }

    pub async fn delete_sheet(&self, token: &str, sheet_id: &str) -> Result<()> {
        self.batch_update(token, json!({ "deleteSheet": { "sheetId": sheet_id } }))
            .await
            .map(|_| ())
    }

    pub async fn set_cell_style(
        &self,
        token: &str,
        sheet_id: &str,
        range: &str,
        style: &CellStyle,
    ) -> Result<()> {
        let update = json!({
            "updateCells": {
                "range": { "sheetId": sheet_id, "range": range },
                "style": style,
            }
        });
        self.batch_update(token, update).await.map(|_| ())
    }

    pub async fn merge_cells(&self, token: &str, sheet_id: &str, range: &str) -> Result<()> {
        let update = json!({
            "mergeCells": { "range": { "sheetId": sheet_id, "range": range } }
        });
        self.batch_update(token, update).await.map(|_| ())
    }

    /// Set row height or column width in pixels for `start..end`.
    pub async fn set_dimension(
        &self,
        token: &str,
        sheet_id: &str,
        dimension: Dimension,
        start: u32,
        end: u32,
        pixel_size: u32,
    ) -> Result<()> {
        let update = json!({
            "updateDimensionProperties": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": dimension,
                    "startIndex": start,
                    "endIndex": end,
                },
                "properties": { "pixelSize": pixel_size },
                "fields": "pixelSize",
            }
        });
        self.batch_update(token, update).await.map(|_| ())
    }

    async fn batch_update(&self, token: &str, update: Value) -> Result<BatchUpdateReply> {
        let request = ApiRequest::post(format!("{}/sheets_batch_update", spreadsheet_path(token)))
            .json(&json!({ "requests": [update] }))?;
        // Some batch operations answer without `data`
        let envelope: Envelope<BatchUpdateReply> = self.client.send(request).await?;
        Ok(envelope.into_data()?.unwrap_or_default())
    }
}

fn spreadsheet_path(token: &str) -> String {
    format!("/sheets/v3/spreadsheets/{}", urlencoding::encode(token))
}

fn values_path(token: &str, range: &str, suffix: &str) -> String {
    format!("{}/values/{range}{suffix}", spreadsheet_path(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::MockLark;

    const PREFIX: &str = "/open-apis/sheets/v3/spreadsheets/sht_1";

    #[test]
    fn cell_style_omits_unset_fields() {
        let style = CellStyle {
            bold: true,
            background_color: Some(Color::rgb(1.0, 0.0, 0.0)),
            ..CellStyle::default()
        };
        let value = serde_json::to_value(&style).unwrap();
        assert_eq!(
            value,
            json!({ "backgroundColor": { "red": 1.0, "green": 0.0, "blue": 0.0 }, "bold": true })
        );
    }

    #[tokio::test]
    async fn get_parses_metainfo() {
        let mock = MockLark::ok(json!({
            "sheet_token": "sht_1",
            "title": "Budget",
            "properties": { "sheetCount": 3 }
        }))
        .await;
        let client = mock.client();

        let sheet = client.sheets().get("sht_1").await.unwrap();
        assert_eq!(sheet.sheet_token, "sht_1");
        assert_eq!(sheet.title, "Budget");
        assert_eq!(sheet.properties["sheetCount"], 3);
        assert_eq!(mock.last().path, format!("{PREFIX}/metainfo"));
    }

    #[tokio::test]
    async fn token_is_encoded_but_range_is_not() {
        let mock = MockLark::ok(json!({ "values": [] })).await;
        let client = mock.client();

        client
            .sheets()
            .read_range("sht/1 a", "Sheet1!A1:B2")
            .await
            .unwrap();
        assert_eq!(
            mock.last().path,
            "/open-apis/sheets/v3/spreadsheets/sht%2F1%20a/values/Sheet1!A1:B2"
        );
    }

    #[tokio::test]
    async fn read_range_returns_rows() {
        let mock = MockLark::ok(json!({ "values": [["a", 1], ["b", 2]] })).await;
        let client = mock.client();

        let rows = client.sheets().read_range("sht_1", "Sheet1!A1:B2").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], 2);

        let captured = mock.last();
        assert_eq!(captured.method, "GET");
        assert_eq!(captured.path, format!("{PREFIX}/values/Sheet1!A1:B2"));
    }

    #[tokio::test]
    async fn write_append_and_clear_use_their_routes() {
        let mock = MockLark::json(json!({ "code": 0, "msg": "success" })).await;
        let client = mock.client();
        let sheets = client.sheets();
        let values = vec![vec![json!("x"), json!(1)]];

        sheets.write_range("sht_1", "Sheet1!A1:B1", &values).await.unwrap();
        sheets.append_range("sht_1", "Sheet1!A1:B1", &values).await.unwrap();
        sheets.clear_range("sht_1", "Sheet1!A1:B1").await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].json()["values"], json!([["x", 1]]));
        assert_eq!(requests[1].method, "POST");
        assert_eq!(
            requests[1].path,
            format!("{PREFIX}/values/Sheet1!A1:B1:append")
        );
        assert_eq!(requests[2].path, format!("{PREFIX}/values/Sheet1!A1:B1:clear"));
        assert!(requests[2].body.is_empty());
    }

    #[tokio::test]
    async fn get_sheets_lists_worksheets() {
        let mock = MockLark::ok(json!({
            "sheets": [
                { "sheetId": "s1", "title": "Sheet1", "index": 0 },
                { "sheetId": "s2", "title": "Sheet2", "index": 1 }
            ]
        }))
        .await;
        let client = mock.client();

        let sheets = client.sheets().get_sheets("sht_1").await.unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[1].sheet_id, "s2");
        assert_eq!(sheets[1].index, 1);
        assert_eq!(mock.last().path, format!("{PREFIX}/sheets/query"));
    }

    #[tokio::test]
    async fn add_sheet_returns_new_sheet_id() {
        let mock = MockLark::ok(json!({
            "replies": [{ "addSheet": { "properties": { "sheetId": "s9", "title": "Q4" } } }]
        }))
        .await;
        let client = mock.client();

        let id = client.sheets().add_sheet("sht_1", "Q4").await.unwrap();
        assert_eq!(id, "s9");

        let captured = mock.last();
        assert_eq!(captured.path, format!("{PREFIX}/sheets_batch_update"));
        assert_eq!(
            captured.json()["requests"][0]["addSheet"]["properties"]["title"],
            "Q4"
        );
    }

    #[tokio::test]
    async fn add_sheet_without_reply_is_decode_error() {
        let mock = MockLark::ok(json!({ "replies": [] })).await;
        let client = mock.client();

        let err = client.sheets().add_sheet("sht_1", "Q4").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn batch_updates_build_expected_requests() {
        let mock = MockLark::ok(json!({ "replies": [{}] })).await;
        let client = mock.client();
        let sheets = client.sheets();

        sheets.delete_sheet("sht_1", "s1").await.unwrap();
        sheets.merge_cells("sht_1", "s1", "A1:B2").await.unwrap();
        sheets
            .set_dimension("sht_1", "s1", Dimension::Column, 0, 3, 120)
            .await
            .unwrap();
        let style = CellStyle {
            italic: true,
            ..CellStyle::default()
        };
        sheets.set_cell_style("sht_1", "s1", "A1:A1", &style).await.unwrap();

        let requests: Vec<Value> = mock
            .requests()
            .iter()
            .map(|r| r.json()["requests"][0].clone())
            .collect();
        assert_eq!(requests[0], json!({ "deleteSheet": { "sheetId": "s1" } }));
        assert_eq!(requests[1]["mergeCells"]["range"]["range"], "A1:B2");
        let dim = &requests[2]["updateDimensionProperties"];
        assert_eq!(dim["range"]["dimension"], "COLUMN");
        assert_eq!(dim["range"]["endIndex"], 3);
        assert_eq!(dim["properties"]["pixelSize"], 120);
        assert_eq!(requests[3]["updateCells"]["style"], json!({ "italic": true }));
    }

    #[tokio::test]
    async fn batch_update_failure_is_api_error() {
        let mock = MockLark::api_error(90202, "wrong sheet id").await;
        let client = mock.client();

        let err = client.sheets().delete_sheet("sht_1", "nope").await.unwrap_err();
        assert_eq!(err.api_code(), Some(90202));
    }
}
