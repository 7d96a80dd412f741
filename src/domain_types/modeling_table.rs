use chrono::NaiveDate;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// 每商品一張的建模表，以列式儲存數據，便於批量計算。
///
/// 每一列代表一個交易日：`target` 是上游預先前移過的下一期已實現
/// 波動率代理值（表內的「下一列」絕不能當作標籤使用），特徵矩陣
/// 包含基準欄位與候選外生訊號欄位。列順序嚴格按時間遞增，引擎
/// 不得重排。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelingTable {
    pub commodity: String,
    pub dates: Vec<NaiveDate>,
    pub target: Array1<f64>,
    pub features: Array2<f64>, // 列式特徵矩陣 [rows=交易日, cols=特徵]
    pub columns: Vec<String>,  // 特徵欄名稱
}

impl ModelingTable {
    /// 創建新的建模表
    pub fn new(
        commodity: String,
        dates: Vec<NaiveDate>,
        target: Array1<f64>,
        features: Array2<f64>,
        columns: Vec<String>,
    ) -> Self {
        Self {
            commodity,
            dates,
            target,
            features,
            columns,
        }
    }

    /// 獲取資料列數
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// 檢查是否為空
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// 獲取特定特徵欄的索引
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col == name)
    }

    /// 獲取特定特徵欄的數據
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let index = self.column_index(name)?;
        Some(self.features.column(index))
    }

    /// 獲取日期區間內的子集（含兩端；None 表示該端不限制）
    pub fn restrict_dates(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let keep: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| start.map_or(true, |s| **d >= s) && end.map_or(true, |e| **d <= e))
            .map(|(i, _)| i)
            .collect();

        self.take_rows(&keep)
    }

    /// 保留目標值與指定特徵欄全部有限的列；不合格的列被剔除而非補值
    pub fn retain_finite(&self, required: &[usize]) -> Self {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| {
                self.target[i].is_finite()
                    && required.iter().all(|&c| self.features[[i, c]].is_finite())
            })
            .collect();

        self.take_rows(&keep)
    }

    /// 以列索引抽取子集，保持原有順序
    fn take_rows(&self, rows: &[usize]) -> Self {
        let mut dates = Vec::with_capacity(rows.len());
        let mut target = Array1::zeros(rows.len());
        let mut features = Array2::zeros((rows.len(), self.columns.len()));

        for (new_i, &old_i) in rows.iter().enumerate() {
            dates.push(self.dates[old_i]);
            target[new_i] = self.target[old_i];
            for col in 0..self.columns.len() {
                features[[new_i, col]] = self.features[[old_i, col]];
            }
        }

        Self {
            commodity: self.commodity.clone(),
            dates,
            target,
            features,
            columns: self.columns.clone(),
        }
    }

    /// 取得 [start, end) 列範圍的唯讀視窗
    pub fn slice(&self, start: usize, end: usize) -> TableSlice<'_> {
        debug_assert!(start <= end && end <= self.len());
        TableSlice {
            table: self,
            start,
            end,
        }
    }

    /// 抽取單一列的指定特徵值（依 feature_ids 順序）
    pub fn feature_row(&self, row: usize, feature_ids: &[usize]) -> Array1<f64> {
        Array1::from_iter(feature_ids.iter().map(|&c| self.features[[row, c]]))
    }
}

/// 建模表的唯讀視窗，供單次模型擬合使用。
///
/// 視窗只借用底層表，不複製數據；訓練視窗嚴格落在評估列之前，
/// 這是整個評估協定不產生前視偏誤的根基。
#[derive(Debug, Clone, Copy)]
pub struct TableSlice<'a> {
    table: &'a ModelingTable,
    start: usize,
    end: usize,
}

impl<'a> TableSlice<'a> {
    /// 視窗內的列數
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// 檢查視窗是否為空
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// 視窗內的目標值
    pub fn targets(&self) -> ArrayView1<'a, f64> {
        self.table.target.slice(ndarray::s![self.start..self.end])
    }

    /// 視窗內的完整特徵矩陣
    pub fn features(&self) -> ArrayView2<'a, f64> {
        self.table.features.slice(ndarray::s![self.start..self.end, ..])
    }

    /// 抽取視窗內指定特徵欄組成的矩陣（依 feature_ids 順序）
    pub fn feature_matrix(&self, feature_ids: &[usize]) -> Array2<f64> {
        let mut out = Array2::zeros((self.len(), feature_ids.len()));
        for (j, &c) in feature_ids.iter().enumerate() {
            for i in 0..self.len() {
                out[[i, j]] = self.table.features[[self.start + i, c]];
            }
        }
        out
    }
}
