//! Dataset handles and settings documents.
//!
//! # Responsibility
//! - Expose dataset-level calls: settings, schema, metadata, partitions,
//!   data clearing, uploaded files, usages.
//! - Shape the settings document through the storage-family helpers.
//!
//! # Invariants
//! - Settings documents are sent back whole; there is no partial update.
//! - Helper mutations stay local until `save`.

use crate::client::CanopyClient;
use crate::transport::{decode, ApiCall, ApiError, ApiResult, UploadFile};
use serde_json::{json, Map, Value};
use std::fmt::{Debug, Formatter};

/// Dataset types backed by files on a connection.
const FILE_LIKE_TYPES: &[&str] = &[
    "Filesystem",
    "UploadedFiles",
    "FilesInFolder",
    "HDFS",
    "S3",
    "Azure",
    "GCS",
    "FTP",
    "SCP",
    "SFTP",
];

/// Dataset types backed by SQL databases.
const SQL_TYPES: &[&str] = &[
    "JDBC",
    "PostgreSQL",
    "MySQL",
    "Vertica",
    "Snowflake",
    "Redshift",
    "Greenplum",
    "Teradata",
    "Oracle",
    "SQLServer",
    "SAPHANA",
    "Netezza",
    "BigQuery",
    "Athena",
    "hiveserver2",
];

/// Storage family of a dataset type; decides which settings helpers apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFamily {
    /// Files on a connection (S3, HDFS, local filesystem, ...).
    FileLike,
    /// Table in a SQL database.
    Sql,
    /// Anything else; only the raw document applies.
    Other,
}

/// One entry from the dataset listing.
pub struct DatasetListItem<'a> {
    client: &'a CanopyClient,
    project_key: String,
    name: String,
    raw: Value,
}

impl Debug for DatasetListItem<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetListItem")
            .field("project_key", &self.project_key)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<'a> DatasetListItem<'a> {
    pub(crate) fn from_entry(
        client: &'a CanopyClient,
        project_key: String,
        raw: Value,
    ) -> ApiResult<Self> {
        let name = raw
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::InvalidResponse("dataset entry has no name".to_string()))?;
        Ok(Self {
            client,
            project_key,
            name,
            raw,
        })
    }

    /// Dataset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable dataset id, when the server exposes one.
    pub fn id(&self) -> Option<&str> {
        self.raw.get("id").and_then(Value::as_str)
    }

    /// Dataset type name, e.g. `PostgreSQL` or `S3`.
    pub fn kind(&self) -> Option<&str> {
        self.raw.get("type").and_then(Value::as_str)
    }

    /// Connection name from the dataset params.
    pub fn connection(&self) -> Option<&str> {
        self.raw
            .get("params")
            .and_then(|params| params.get("connection"))
            .and_then(Value::as_str)
    }

    /// Schema column descriptor by column name.
    pub fn schema_column(&self, column_name: &str) -> Option<&Value> {
        self.raw
            .get("schema")
            .and_then(|schema| schema.get("columns"))
            .and_then(Value::as_array)
            .and_then(|columns| {
                columns
                    .iter()
                    .find(|column| column.get("name").and_then(Value::as_str) == Some(column_name))
            })
    }

    /// Raw listing entry.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Full handle on this dataset.
    pub fn to_dataset(&self) -> Dataset<'a> {
        Dataset::new(self.client, self.project_key.clone(), self.name.clone())
    }
}

/// Handle on one dataset.
pub struct Dataset<'a> {
    client: &'a CanopyClient,
    project_key: String,
    dataset_name: String,
}

impl Debug for Dataset<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("project_key", &self.project_key)
            .field("dataset_name", &self.dataset_name)
            .finish_non_exhaustive()
    }
}

impl<'a> Dataset<'a> {
    pub(crate) fn new(client: &'a CanopyClient, project_key: String, dataset_name: String) -> Self {
        Self {
            client,
            project_key,
            dataset_name,
        }
    }

    /// Dataset name this handle points at.
    pub fn name(&self) -> &str {
        &self.dataset_name
    }

    /// Deletes the dataset. `drop_data` also drops the underlying data.
    pub fn delete(&self, drop_data: bool) -> ApiResult<()> {
        self.client.transport().perform_empty(
            &ApiCall::delete(&[
                "projects",
                self.project_key.as_str(),
                "datasets",
                self.dataset_name.as_str(),
            ])
            .with_query("dropData", if drop_data { "true" } else { "false" }),
        )
    }

    /// Fetches the settings document.
    pub fn settings(&self) -> ApiResult<DatasetSettings<'a>> {
        let value = self.client.transport().perform_json(&ApiCall::get(&[
            "projects",
            self.project_key.as_str(),
            "datasets",
            self.dataset_name.as_str(),
        ]))?;
        let Value::Object(document) = value else {
            return Err(ApiError::InvalidResponse(
                "dataset settings is not an object".to_string(),
            ));
        };
        Ok(DatasetSettings {
            client: self.client,
            project_key: self.project_key.clone(),
            dataset_name: self.dataset_name.clone(),
            document,
        })
    }

    /// Fetches the schema.
    pub fn schema(&self) -> ApiResult<Value> {
        self.client.transport().perform_json(&ApiCall::get(&[
            "projects",
            self.project_key.as_str(),
            "datasets",
            self.dataset_name.as_str(),
            "schema",
        ]))
    }

    /// Replaces the schema. Returns the server's answer.
    pub fn set_schema(&self, schema: Value) -> ApiResult<Value> {
        self.client.transport().perform_json(
            &ApiCall::put(&[
                "projects",
                self.project_key.as_str(),
                "datasets",
                self.dataset_name.as_str(),
                "schema",
            ])
            .with_body(schema),
        )
    }

    /// Fetches the metadata block (tags, custom fields, checklists).
    pub fn metadata(&self) -> ApiResult<Value> {
        self.client.transport().perform_json(&ApiCall::get(&[
            "projects",
            self.project_key.as_str(),
            "datasets",
            self.dataset_name.as_str(),
            "metadata",
        ]))
    }

    /// Replaces the metadata block. Returns the server's answer.
    pub fn set_metadata(&self, metadata: Value) -> ApiResult<Value> {
        self.client.transport().perform_json(
            &ApiCall::put(&[
                "projects",
                self.project_key.as_str(),
                "datasets",
                self.dataset_name.as_str(),
                "metadata",
            ])
            .with_body(metadata),
        )
    }

    /// Lists the partition identifiers of a partitioned dataset.
    pub fn list_partitions(&self) -> ApiResult<Vec<String>> {
        let value = self.client.transport().perform_json(&ApiCall::get(&[
            "projects",
            self.project_key.as_str(),
            "datasets",
            self.dataset_name.as_str(),
            "partitions",
        ]))?;
        decode("partition listing", value)
    }

    /// Empties the dataset, or only `partitions` when given as a
    /// comma-separated list of partition identifiers. Returns the server's
    /// answer.
    pub fn clear(&self, partitions: Option<&str>) -> ApiResult<Value> {
        let mut call = ApiCall::delete(&[
            "projects",
            self.project_key.as_str(),
            "datasets",
            self.dataset_name.as_str(),
            "data",
        ]);
        if let Some(partitions) = partitions {
            call = call.with_query("partitions", partitions);
        }
        self.client.transport().perform_json(&call)
    }

    /// Adds one file to an uploaded-files dataset.
    pub fn uploaded_add_file(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<Value> {
        let call = ApiCall::post(&[
            "projects",
            self.project_key.as_str(),
            "datasets",
            self.dataset_name.as_str(),
            "uploaded",
            "files",
        ]);
        self.client.transport().perform_upload(
            &call,
            &UploadFile {
                file_name: file_name.to_string(),
                bytes,
            },
        )
    }

    /// Lists the files of an uploaded-files dataset.
    pub fn uploaded_list_files(&self) -> ApiResult<Value> {
        self.client.transport().perform_json(&ApiCall::get(&[
            "projects",
            self.project_key.as_str(),
            "datasets",
            self.dataset_name.as_str(),
            "uploaded",
            "files",
        ]))
    }

    /// Lists the recipes and analyses reading from or writing to this dataset.
    pub fn usages(&self) -> ApiResult<Value> {
        self.client.transport().perform_json(&ApiCall::get(&[
            "projects",
            self.project_key.as_str(),
            "datasets",
            self.dataset_name.as_str(),
            "usages",
        ]))
    }
}

/// Owning store for one dataset's settings document.
///
/// Helpers shape the local document only; nothing reaches the server until
/// [`DatasetSettings::save`].
pub struct DatasetSettings<'a> {
    client: &'a CanopyClient,
    project_key: String,
    dataset_name: String,
    document: Map<String, Value>,
}

impl Debug for DatasetSettings<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetSettings")
            .field("dataset_name", &self.dataset_name)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl DatasetSettings<'_> {
    /// Raw settings document.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Mutable raw document, for fields without a dedicated helper.
    pub fn raw_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.document
    }

    /// Dataset type name.
    pub fn kind(&self) -> Option<&str> {
        self.document.get("type").and_then(Value::as_str)
    }

    /// `params` block of the settings.
    pub fn params(&self) -> Option<&Value> {
        self.document.get("params")
    }

    /// Storage family of this dataset's type.
    pub fn storage_family(&self) -> StorageFamily {
        match self.kind() {
            Some(kind) if FILE_LIKE_TYPES.contains(&kind) => StorageFamily::FileLike,
            Some(kind) if SQL_TYPES.contains(&kind) => StorageFamily::Sql,
            _ => StorageFamily::Other,
        }
    }

    /// Drops every partitioning dimension.
    pub fn remove_partitioning(&mut self) {
        self.document
            .insert("partitioning".to_string(), json!({ "dimensions": [] }));
    }

    /// Adds a discrete partitioning dimension.
    pub fn add_discrete_partitioning_dimension(&mut self, dimension_name: &str) {
        self.push_partitioning_dimension(json!({ "name": dimension_name, "type": "value" }));
    }

    /// Adds a time partitioning dimension. `period` is one of `YEAR`,
    /// `MONTH`, `DAY`, `HOUR`.
    pub fn add_time_partitioning_dimension(&mut self, dimension_name: &str, period: &str) {
        self.push_partitioning_dimension(json!({
            "name": dimension_name,
            "type": "time",
            "params": { "period": period },
        }));
    }

    /// Appends one column to the schema carried inside the settings.
    pub fn add_raw_schema_column(&mut self, column_name: &str, column_type: &str) {
        let column = json!({ "name": column_name, "type": column_type });
        let schema = self
            .document
            .entry("schema".to_string())
            .or_insert_with(|| json!({ "columns": [] }));
        if let Some(columns) = schema.get_mut("columns").and_then(Value::as_array_mut) {
            columns.push(column);
            return;
        }
        *schema = json!({ "columns": [column] });
    }

    /// File-like datasets: points the dataset at a connection and path.
    pub fn set_connection_and_path(&mut self, connection: &str, path: &str) {
        with_object(&mut self.document, "params", |params| {
            params.insert(
                "connection".to_string(),
                Value::String(connection.to_string()),
            );
            params.insert("path".to_string(), Value::String(path.to_string()));
        });
    }

    /// File-like datasets: sets the storage format.
    pub fn set_format(&mut self, format_type: &str, format_params: Value) {
        self.document.insert(
            "formatType".to_string(),
            Value::String(format_type.to_string()),
        );
        self.document.insert("formatParams".to_string(), format_params);
    }

    /// File-like datasets: sets a CSV storage format.
    pub fn set_csv_format(
        &mut self,
        separator: &str,
        style: &str,
        skip_rows_before_header: u32,
        parse_header_row: bool,
        skip_rows_after_header: u32,
    ) {
        self.set_format(
            "csv",
            json!({
                "style": style,
                "separator": separator,
                "skipRowsBeforeHeader": skip_rows_before_header,
                "parseHeaderRow": parse_header_row,
                "skipRowsAfterHeader": skip_rows_after_header,
            }),
        );
    }

    /// File-like partitioned datasets: sets the partition path pattern.
    pub fn set_partitioning_file_pattern(&mut self, pattern: &str) {
        with_object(&mut self.document, "partitioning", |partitioning| {
            partitioning.insert(
                "filePathPattern".to_string(),
                Value::String(pattern.to_string()),
            );
        });
    }

    /// SQL datasets: points the dataset at one table.
    pub fn set_table(&mut self, connection: &str, schema: &str, table: &str) {
        with_object(&mut self.document, "params", |params| {
            params.insert("mode".to_string(), Value::String("table".to_string()));
            params.insert(
                "connection".to_string(),
                Value::String(connection.to_string()),
            );
            params.insert("schema".to_string(), Value::String(schema.to_string()));
            params.insert("table".to_string(), Value::String(table.to_string()));
        });
    }

    /// Persists the whole settings document.
    pub fn save(&self) -> ApiResult<()> {
        self.client.transport().perform_empty(
            &ApiCall::put(&[
                "projects",
                self.project_key.as_str(),
                "datasets",
                self.dataset_name.as_str(),
            ])
            .with_body(Value::Object(self.document.clone())),
        )
    }

    fn push_partitioning_dimension(&mut self, dimension: Value) {
        let partitioning = self
            .document
            .entry("partitioning".to_string())
            .or_insert_with(|| json!({ "dimensions": [] }));
        if let Some(dimensions) = partitioning
            .get_mut("dimensions")
            .and_then(Value::as_array_mut)
        {
            dimensions.push(dimension);
            return;
        }
        *partitioning = json!({ "dimensions": [dimension] });
    }
}

/// Runs `mutate` on `document[key]`, creating or replacing it with an empty
/// object when it is missing or not an object.
fn with_object(
    document: &mut Map<String, Value>,
    key: &str,
    mutate: impl FnOnce(&mut Map<String, Value>),
) {
    let entry = document
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Some(object) = entry.as_object_mut() {
        mutate(object);
    }
}
