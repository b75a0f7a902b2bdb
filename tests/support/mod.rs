#![allow(dead_code)]

pub mod socket_guard;

use serde_json::{Value, json};

/// Builds an ODE product-query response whose file URLs point at `base`.
///
/// Each entry is `(pds_id, &[file_name])`; files are served from
/// `<base>/files/<file_name>`.
pub fn ode_response(base: &str, products: &[(&str, &[&str])]) -> Value {
    if products.is_empty() {
        return json!({"ODEResults": {"Status": "Success", "Products": "No Products Found"}});
    }
    let products: Vec<Value> = products
        .iter()
        .map(|(pds_id, files)| {
            let files: Vec<Value> = files
                .iter()
                .map(|name| json!({"FileName": name, "URL": format!("{base}/files/{name}")}))
                .collect();
            json!({"pdsid": pds_id, "Product_files": {"Product_file": files}})
        })
        .collect();
    json!({"ODEResults": {"Status": "Success", "Products": {"Product": products}}})
}
