use anyhow::Result;
use clap::Parser;
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use therion_dem::inputs::is_raster;
use therion_dem::{
    collect_input_pairs, pair_inputs, world_file_for, ConversionSettings, CoordinateSystem,
    InputPair, RasterDecoder, Session, SurfaceWriter,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 入力GeoTIFFとワールドファイル(.tfw)、GeoTIFFのみ、またはディレクトリ
    #[arg(value_name = "INPUT", required = true, num_args = 1..=2)]
    inputs: Vec<PathBuf>,

    /// 出力ディレクトリ
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// 並列処理スレッド数（デフォルト: CPUコア数）
    #[arg(short, long)]
    threads: Option<usize>,

    /// リサンプリング係数（1未満は1として扱う）
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    factor: i64,

    /// 座標系 (ijtsk, jtsk, utm33n, utm34n, wgs84)
    #[arg(long = "cs", value_name = "ID", default_value = "ijtsk")]
    coordinate_system: CoordinateSystem,

    /// 出力をZIPにもまとめる
    #[arg(long)]
    zip: bool,

    /// 変換せずにデータ情報と変換後のグリッドを表示
    #[arg(long)]
    info: bool,
}

impl Args {
    fn settings(&self) -> ConversionSettings {
        ConversionSettings::new(self.factor, self.coordinate_system)
    }
}

fn main() -> Result<()> {
    // ログの初期化
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // CLI引数の解析
    let args = Args::parse();

    // 処理開始時間を記録
    let start_time = std::time::Instant::now();

    // スレッドプールの設定
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new().num_threads(threads).build_global()?;
    }

    // 出力ディレクトリの作成
    fs::create_dir_all(&args.output)?;

    // ラスタデコーダはすべての変換で共有する
    let decoder = Arc::new(RasterDecoder::new());

    // 入力パスの処理
    match args.inputs.as_slice() {
        [dir] if dir.is_dir() => {
            info!("Processing directory: {:?}", dir);
            process_directory(dir, &args, &decoder)?;
        }
        [raster] if raster.is_file() && is_raster(raster) => {
            let Some(world_file) = world_file_for(raster) else {
                error!("No world file found for {:?}", raster);
                anyhow::bail!("Input raster must have a .tfw file next to it");
            };
            let pair = InputPair::new(raster, world_file);
            process_pair(&pair, &args.output, &args, &decoder)?;
        }
        [single] => {
            error!("Invalid input path: {:?}", single);
            anyhow::bail!("Input must be a .tif/.tiff file, a .tif/.tfw pair or a directory");
        }
        paths => {
            let pair = pair_inputs(paths)?;
            process_pair(&pair, &args.output, &args, &decoder)?;
        }
    }

    // 処理時間を表示
    let elapsed = start_time.elapsed();
    info!("Total processing time: {:?}", elapsed);

    Ok(())
}

fn process_pair(
    pair: &InputPair,
    output_dir: &Path,
    args: &Args,
    decoder: &Arc<RasterDecoder>,
) -> Result<()> {
    info!("Processing pair: {:?} + {:?}", pair.raster, pair.world_file);

    let settings = args.settings();
    let mut session = Session::with_decoder(decoder.clone());

    // ワールドファイルとGeoTIFFを解析
    let parsed = session.parse(pair)?;

    if args.info {
        // 変換せずにプレビューを表示
        println!("{}", parsed.preview(&settings));
        return Ok(());
    }

    // Therion形式に変換
    let output = session.convert(&settings)?;
    let writer = SurfaceWriter::new();

    writer.write(output, output_dir)?;

    if args.zip {
        let archive_path = output_dir.join(format!("{}.zip", output.base_filename));
        writer.write_archive(output, &archive_path)?;
    }

    info!(
        "Written surface: {} ({}x{})",
        output.th_filename(),
        output.width,
        output.height
    );

    Ok(())
}

fn process_directory(dir: &Path, args: &Args, decoder: &Arc<RasterDecoder>) -> Result<()> {
    use rayon::prelude::*;

    // GeoTIFFとワールドファイルの組を再帰的に収集
    let pairs = collect_input_pairs(dir)?;
    info!("Found {} input pairs (TIF/TFW)", pairs.len());

    // 並列処理でファイルを変換
    let results: Vec<Result<()>> = pairs
        .par_iter()
        .map(|pair| {
            // debug.logが衝突しないよう入力ごとにサブディレクトリへ出力
            let stem = pair
                .raster
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("surface");
            process_pair(pair, &args.output.join(stem), args, decoder)
        })
        .collect();

    // エラーをチェック
    let mut errors = Vec::new();
    for (i, result) in results.into_iter().enumerate() {
        if let Err(e) = result {
            errors.push(format!("{}: {}", pairs[i].raster.display(), e));
        }
    }

    if !errors.is_empty() {
        error!("Failed to process {} files:", errors.len());
        for err in &errors {
            error!("  {}", err);
        }
        anyhow::bail!("{} files failed to process", errors.len());
    }

    Ok(())
}
