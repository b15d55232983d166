//! Product catalog: the fixed set of configuration product types and their file naming.

use crate::error::{BundleError, ConfigError};
use crate::metadata::ROOT_METADATA_FILE;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

/// Syntax a product's content file is written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentLanguage {
    Json,
    Yaml,
}

impl ContentLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentLanguage::Json => "json",
            ContentLanguage::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ContentLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentLanguage {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ContentLanguage::Json),
            "yaml" | "yml" => Ok(ContentLanguage::Yaml),
            _ => Err(BundleError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// One configuration product type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: &'static str,
    #[serde(skip)]
    pub display_name: &'static str,
    pub label: &'static str,
    pub language: ContentLanguage,
    #[serde(skip)]
    pub file_name: &'static str,
    #[serde(skip)]
    pub metadata_file_name: &'static str,
}

const BUILTIN_PRODUCTS: &[Product] = &[
    Product {
        id: "product",
        display_name: "product",
        label: "Product",
        language: ContentLanguage::Yaml,
        file_name: "product.yaml",
        metadata_file_name: "product_metadata.json",
    },
    Product {
        id: "tenant",
        display_name: "tenant",
        label: "Tenant",
        language: ContentLanguage::Yaml,
        file_name: "tenant.yaml",
        metadata_file_name: "tenant_metadata.json",
    },
    Product {
        id: "productfamily",
        display_name: "productfamily",
        label: "ProductFamily",
        language: ContentLanguage::Yaml,
        file_name: "productfamily.yaml",
        metadata_file_name: "productfamily_metadata.json",
    },
    Product {
        id: "api",
        display_name: "api",
        label: "API",
        language: ContentLanguage::Json,
        file_name: "api.json",
        metadata_file_name: "api_metadata.json",
    },
];

/// Immutable lookup table by id with a reverse index by label. Built once; see [`catalog`].
#[derive(Clone, Debug)]
pub struct ProductCatalog {
    products: Vec<Product>,
    by_id: HashMap<&'static str, usize>,
    by_label: HashMap<&'static str, usize>,
}

impl ProductCatalog {
    /// Build a catalog. Ids, labels and every file name must be distinct so bundle entries never collide.
    pub fn new(products: Vec<Product>) -> Result<Self, ConfigError> {
        let mut by_id = HashMap::with_capacity(products.len());
        let mut by_label = HashMap::with_capacity(products.len());
        let mut file_names: HashSet<&str> = HashSet::new();
        file_names.insert(ROOT_METADATA_FILE);
        for (i, p) in products.iter().enumerate() {
            if by_id.insert(p.id, i).is_some() {
                return Err(ConfigError::InvalidValue {
                    key: "product id",
                    message: format!("duplicate id '{}'", p.id),
                });
            }
            if by_label.insert(p.label, i).is_some() {
                return Err(ConfigError::InvalidValue {
                    key: "product label",
                    message: format!("duplicate label '{}'", p.label),
                });
            }
            for name in [p.file_name, p.metadata_file_name] {
                if !file_names.insert(name) {
                    return Err(ConfigError::DuplicateFileName(name.to_string()));
                }
            }
        }
        Ok(ProductCatalog {
            products,
            by_id,
            by_label,
        })
    }

    /// The platform's four product types.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_PRODUCTS.to_vec()).expect("built-in product table has distinct names")
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up by id: exact match, then case-insensitive.
    pub fn resolve(&self, identifier: &str) -> Result<&Product, BundleError> {
        lookup(&self.products, &self.by_id, identifier, |p| p.id)
    }

    /// Look up by label: exact match, then case-insensitive.
    pub fn resolve_by_label(&self, label: &str) -> Result<&Product, BundleError> {
        lookup(&self.products, &self.by_label, label, |p| p.label)
    }

    /// Resolve a collection of identifiers. Duplicates collapse; result follows catalog order.
    pub fn resolve_all<I, S>(&self, identifiers: I) -> Result<Vec<&Product>, BundleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut positions = BTreeSet::new();
        for id in identifiers {
            let product = self.resolve(id.as_ref())?;
            positions.insert(self.by_id[product.id]);
        }
        Ok(positions.into_iter().map(|i| &self.products[i]).collect())
    }

    /// Product whose content file is named `file_name`, if any.
    pub fn find_by_file_name(&self, file_name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.file_name == file_name)
    }
}

fn lookup<'a>(
    products: &'a [Product],
    index: &HashMap<&'static str, usize>,
    key: &str,
    field: impl Fn(&Product) -> &'static str,
) -> Result<&'a Product, BundleError> {
    let key = key.trim();
    if let Some(&i) = index.get(key) {
        return Ok(&products[i]);
    }
    products
        .iter()
        .find(|p| field(p).eq_ignore_ascii_case(key))
        .ok_or_else(|| BundleError::UnknownProduct(key.to_string()))
}

/// Process-wide catalog of the built-in products.
pub fn catalog() -> &'static ProductCatalog {
    static CATALOG: OnceLock<ProductCatalog> = OnceLock::new();
    CATALOG.get_or_init(ProductCatalog::builtin)
}
